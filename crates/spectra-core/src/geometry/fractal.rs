use super::{GeometryBuffer, Primitive};
use crate::constants::LSYSTEM_MAX_SYMBOLS;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::f32::consts::PI;

/// Built-in L-system grammars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FractalKind {
    Dragon,
    Koch,
    Sierpinski,
    Tree,
}

/// Axiom, production rules and the default turtle parameters of a grammar.
#[derive(Clone, Copy, Debug)]
pub struct LSystemRules {
    pub axiom: &'static str,
    pub rules: &'static [(char, &'static str)],
    pub angle: f32,
    pub scale: f32,
}

impl FractalKind {
    pub fn rules(self) -> LSystemRules {
        match self {
            FractalKind::Dragon => LSystemRules {
                axiom: "FX",
                rules: &[('X', "X+YF+"), ('Y', "-FX-Y")],
                angle: PI / 2.0,
                scale: 0.5,
            },
            FractalKind::Koch => LSystemRules {
                axiom: "F",
                rules: &[('F', "F+F-F-F+F")],
                angle: PI / 2.0,
                scale: 0.3,
            },
            FractalKind::Sierpinski => LSystemRules {
                axiom: "F-G-G",
                rules: &[('F', "F-G+F+G-F"), ('G', "GG")],
                angle: 2.0 * PI / 3.0,
                scale: 0.5,
            },
            FractalKind::Tree => LSystemRules {
                axiom: "F",
                rules: &[('F', "FF+[+F-F-F]-[-F+F+F]")],
                angle: PI / 8.0,
                scale: 0.4,
            },
        }
    }
}

/// Apply the production rules `iterations` times.
///
/// Symbols without a rule are copied unchanged. Rewriting stops early, with
/// a warning, once the next generation would exceed `LSYSTEM_MAX_SYMBOLS`.
pub fn expand_l_system(axiom: &str, rules: &[(char, &str)], iterations: u32) -> String {
    let mut current = axiom.to_owned();
    for generation in 0..iterations {
        let next_len: usize = current
            .chars()
            .map(|c| rule_for(rules, c).map_or(1, str::len))
            .sum();
        if next_len > LSYSTEM_MAX_SYMBOLS {
            log::warn!(
                "[geometry] L-system capped at generation {} of {} ({} symbols)",
                generation,
                iterations,
                current.len()
            );
            break;
        }
        let mut next = String::with_capacity(next_len);
        for c in current.chars() {
            match rule_for(rules, c) {
                Some(replacement) => next.push_str(replacement),
                None => next.push(c),
            }
        }
        current = next;
    }
    current
}

fn rule_for<'a>(rules: &[(char, &'a str)], symbol: char) -> Option<&'a str> {
    rules
        .iter()
        .find(|(lhs, _)| *lhs == symbol)
        .map(|(_, rhs)| *rhs)
}

#[derive(Clone, Copy, Debug)]
struct Turtle {
    position: Vec3,
    direction: Vec3,
    up: Vec3,
}

/// Turtle-interpret an expanded L-system as independent line segments.
///
/// `F` emits a segment of length `scale` along the heading; `+` and `-`
/// turn by `-angle` and `+angle` about the turtle's up vector; `[` and `]`
/// save and restore the whole turtle. Anything else is ignored, including
/// `G` in the Sierpinski grammar, which only shapes the rewriting.
pub fn l_system_fractal(
    axiom: &str,
    rules: &[(char, &str)],
    iterations: u32,
    scale: f32,
    angle: f32,
) -> GeometryBuffer {
    let program = expand_l_system(axiom, rules, iterations);
    let mut positions = Vec::new();
    let mut stack: SmallVec<[Turtle; 16]> = SmallVec::new();
    let mut turtle = Turtle {
        position: Vec3::ZERO,
        direction: Vec3::Y,
        up: Vec3::Z,
    };

    for symbol in program.chars() {
        match symbol {
            'F' => {
                positions.extend_from_slice(&turtle.position.to_array());
                turtle.position += turtle.direction * scale;
                positions.extend_from_slice(&turtle.position.to_array());
            }
            '+' => turtle.direction = Quat::from_axis_angle(turtle.up, -angle) * turtle.direction,
            '-' => turtle.direction = Quat::from_axis_angle(turtle.up, angle) * turtle.direction,
            '[' => stack.push(turtle),
            ']' => {
                if let Some(saved) = stack.pop() {
                    turtle = saved;
                }
            }
            _ => {}
        }
    }

    GeometryBuffer {
        positions,
        indices: None,
        primitive: Primitive::LineList,
    }
}

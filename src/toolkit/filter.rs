use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

use crate::error::{Result, ScreenError};

pub const HEAVY_ATOMS_DESCRIPTOR: &str = "NumHeavyAtoms";

/// Directive suffix → toolkit descriptor name, for `MIN_<NAME>` / `MAX_<NAME>`.
pub const DESCRIPTOR_ALIASES: [(&str, &str); 9] = [
    ("HEAVY_ATOMS", HEAVY_ATOMS_DESCRIPTOR),
    ("MOLWT", "amw"),
    ("LOGP", "CrippenClogP"),
    ("DONORS", "NumHBD"),
    ("ACCEPTORS", "NumHBA"),
    ("ROT_BONDS", "NumRotatableBonds"),
    ("PSA", "tpsa"),
    ("RINGS", "NumRings"),
    ("HETEROATOMS", "NumHeteroatoms"),
];

/// What the filter needs to know about a molecule.
#[derive(Debug, Clone)]
pub struct MolProfile {
    pub descriptors: HashMap<String, f64>,
    pub elements: BTreeSet<String>,
    pub net_charge: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorBound {
    pub descriptor: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    ElementNotAllowed(String),
    MissingDescriptor(String),
    BelowMinimum {
        descriptor: String,
        value: f64,
        min: f64,
    },
    AboveMaximum {
        descriptor: String,
        value: f64,
        max: f64,
    },
    ChargeTooHigh {
        net_charge: i32,
        max: u32,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::ElementNotAllowed(el) => write!(f, "element {el} not allowed"),
            Rejection::MissingDescriptor(d) => write!(f, "descriptor {d} not computed"),
            Rejection::BelowMinimum {
                descriptor,
                value,
                min,
            } => write!(f, "{descriptor}={value} below minimum {min}"),
            Rejection::AboveMaximum {
                descriptor,
                value,
                max,
            } => write!(f, "{descriptor}={value} above maximum {max}"),
            Rejection::ChargeTooHigh { net_charge, max } => {
                write!(f, "net charge {net_charge} exceeds |{max}|")
            }
        }
    }
}

/// Property filter read from a rule file, see `MolFilter::parse` for the syntax.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MolFilter {
    allowed_elements: Option<BTreeSet<String>>,
    bounds: Vec<DescriptorBound>,
    max_abs_charge: Option<u32>,
}

impl MolFilter {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| ScreenError::FilterUnreadable {
                path: path.to_path_buf(),
                source,
            })?;

        let filter = Self::parse(&contents)?;
        log::info!(
            "loaded filter rules from {:?}: {} descriptor bounds, element restriction: {}",
            path,
            filter.bounds.len(),
            filter.allowed_elements.is_some()
        );
        Ok(filter)
    }

    /// One directive per line, `#` starts a comment:
    ///
    /// ```text
    /// ALLOWED_ELEMENTS H C N O F P S Cl Br I
    /// MIN_HEAVY_ATOMS 5
    /// MAX_MOLWT 600
    /// MAX_DESCRIPTOR FractionCSP3 0.9
    /// MAX_ABS_CHARGE 2
    /// ```
    pub fn parse(contents: &str) -> Result<Self> {
        let mut filter = MolFilter::default();

        for (line_idx, raw_line) in contents.lines().enumerate() {
            let line_no = line_idx + 1;
            let line = match raw_line.split_once('#') {
                Some((before, _)) => before,
                None => raw_line,
            }
            .trim();
            if line.is_empty() {
                continue;
            }

            let mut fields = line.split_whitespace();
            let directive = fields.next().unwrap_or_default().to_ascii_uppercase();
            let args = fields.collect::<Vec<_>>();

            match directive.as_str() {
                "ALLOWED_ELEMENTS" => {
                    if args.is_empty() {
                        return Err(rule_error(line_no, "ALLOWED_ELEMENTS needs at least one symbol"));
                    }
                    filter
                        .allowed_elements
                        .get_or_insert_with(BTreeSet::new)
                        .extend(args.iter().map(|s| s.to_string()));
                }
                "MAX_ABS_CHARGE" => {
                    let value = single_arg(line_no, &directive, &args)?;
                    let max = value.parse::<u32>().map_err(|e| {
                        rule_error(line_no, format!("bad charge bound '{value}': {e}"))
                    })?;
                    filter.max_abs_charge = Some(max);
                }
                "MIN_DESCRIPTOR" | "MAX_DESCRIPTOR" => {
                    if args.len() != 2 {
                        return Err(rule_error(
                            line_no,
                            format!("{directive} expects a descriptor name and a value"),
                        ));
                    }
                    let value = parse_value(line_no, args[1])?;
                    filter.set_bound(args[0], directive.starts_with("MIN_"), value);
                }
                _ => {
                    let (is_min, alias) = if let Some(alias) = directive.strip_prefix("MIN_") {
                        (true, alias)
                    } else if let Some(alias) = directive.strip_prefix("MAX_") {
                        (false, alias)
                    } else {
                        return Err(rule_error(line_no, format!("unknown directive {directive}")));
                    };

                    let descriptor = DESCRIPTOR_ALIASES
                        .iter()
                        .find(|(name, _)| *name == alias)
                        .map(|(_, descriptor)| *descriptor)
                        .ok_or_else(|| {
                            rule_error(line_no, format!("unknown property {alias} in {directive}"))
                        })?;

                    let value = parse_value(line_no, single_arg(line_no, &directive, &args)?)?;
                    filter.set_bound(descriptor, is_min, value);
                }
            }
        }

        Ok(filter)
    }

    /// Tightens (never loosens) the heavy atom ceiling.
    pub fn with_max_heavy_atoms(mut self, max_heavy_atoms: Option<u32>) -> Self {
        if let Some(max) = max_heavy_atoms {
            let max = max as f64;
            let current = self
                .bounds
                .iter()
                .find(|b| b.descriptor == HEAVY_ATOMS_DESCRIPTOR)
                .and_then(|b| b.max);
            match current {
                Some(existing) if existing <= max => {}
                _ => self.set_bound(HEAVY_ATOMS_DESCRIPTOR, false, max),
            }
        }
        self
    }

    pub fn bounds(&self) -> &[DescriptorBound] {
        &self.bounds
    }

    pub fn evaluate(&self, profile: &MolProfile) -> std::result::Result<(), Rejection> {
        if let Some(allowed) = &self.allowed_elements {
            if let Some(el) = profile.elements.iter().find(|el| !allowed.contains(*el)) {
                return Err(Rejection::ElementNotAllowed(el.clone()));
            }
        }

        if let Some(max) = self.max_abs_charge {
            if profile.net_charge.unsigned_abs() > max {
                return Err(Rejection::ChargeTooHigh {
                    net_charge: profile.net_charge,
                    max,
                });
            }
        }

        for bound in &self.bounds {
            let value = *profile
                .descriptors
                .get(&bound.descriptor)
                .ok_or_else(|| Rejection::MissingDescriptor(bound.descriptor.clone()))?;

            if let Some(min) = bound.min {
                if value < min {
                    return Err(Rejection::BelowMinimum {
                        descriptor: bound.descriptor.clone(),
                        value,
                        min,
                    });
                }
            }
            if let Some(max) = bound.max {
                if value > max {
                    return Err(Rejection::AboveMaximum {
                        descriptor: bound.descriptor.clone(),
                        value,
                        max,
                    });
                }
            }
        }

        Ok(())
    }

    fn set_bound(&mut self, descriptor: &str, is_min: bool, value: f64) {
        let idx = match self.bounds.iter().position(|b| b.descriptor == descriptor) {
            Some(idx) => idx,
            None => {
                self.bounds.push(DescriptorBound {
                    descriptor: descriptor.to_string(),
                    min: None,
                    max: None,
                });
                self.bounds.len() - 1
            }
        };

        let bound = &mut self.bounds[idx];
        if is_min {
            bound.min = Some(value);
        } else {
            bound.max = Some(value);
        }
    }
}

fn rule_error(line: usize, details: impl Into<String>) -> ScreenError {
    ScreenError::FilterRule {
        line,
        details: details.into(),
    }
}

fn single_arg<'a>(line: usize, directive: &str, args: &[&'a str]) -> Result<&'a str> {
    match args {
        [value] => Ok(value),
        _ => Err(rule_error(
            line,
            format!("{directive} expects exactly one value, got {}", args.len()),
        )),
    }
}

fn parse_value(line: usize, value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .map_err(|e| rule_error(line, format!("bad numeric value '{value}': {e}")))
}

//! Interval patterns such as `"1 b3 5"`.

use std::fmt;

use crate::error::{Result, StaccatoError};

use super::note::{Note, OCTAVE};

/// Scale degree to half-steps above the root.
const DEGREE_HALF_STEPS: [(u32, i32); 15] = [
    (1, 0),
    (2, 2),
    (3, 4),
    (4, 5),
    (5, 7),
    (6, 9),
    (7, 11),
    (8, 12),
    (9, 14),
    (10, 16),
    (11, 17),
    (12, 19),
    (13, 21),
    (14, 23),
    (15, 24),
];

/// An ordered list of scale-degree tokens, each optionally flat (`b`) or sharp (`#`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Intervals {
    degrees: Vec<String>,
}

impl Intervals {
    /// Parse a space-separated interval pattern, validating every degree.
    pub fn new(pattern: &str) -> Result<Self> {
        let degrees: Vec<String> = pattern.split_whitespace().map(str::to_string).collect();
        if degrees.is_empty() {
            return Err(StaccatoError::invalid("interval pattern", pattern));
        }
        for degree in &degrees {
            half_steps(degree)?;
        }
        Ok(Self { degrees })
    }

    /// Derive intervals from notes, measuring every note's pitch class against
    /// the first note's. Differences with no plain degree are spelled as the
    /// flattened next degree (`b3` for three half-steps).
    pub fn from_notes(notes: &[Note]) -> Self {
        let mut degrees = vec!["1".to_string()];
        let Some(root) = notes.first() else {
            return Self { degrees };
        };
        let root_position = root.position_in_octave() as i32;
        for note in &notes[1..] {
            let mut diff = (note.position_in_octave() as i32 - root_position).rem_euclid(OCTAVE as i32);
            let mut degree = String::new();
            if degree_for_half_steps(diff).is_none() {
                diff += 1;
                degree.push('b');
            }
            if let Some(number) = degree_for_half_steps(diff) {
                degree.push_str(&number.to_string());
            }
            degrees.push(degree);
        }
        Self { degrees }
    }

    /// Half-steps above the root for every degree, in order.
    pub fn half_steps(&self) -> Vec<i32> {
        self.degrees
            .iter()
            .map(|d| half_steps(d).unwrap_or(0))
            .collect()
    }

    pub fn nth(&self, n: usize) -> Option<&str> {
        self.degrees.get(n).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.degrees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.degrees.is_empty()
    }

    /// Rotate left by `n` positions.
    pub fn rotate(&mut self, n: usize) -> &mut Self {
        let len = self.degrees.len();
        if len > 0 {
            self.degrees.rotate_left(n % len);
        }
        self
    }

    /// Whether `note`'s pitch class belongs to these intervals above `root`.
    pub fn has(&self, root: &Note, note: &Note) -> bool {
        self.half_steps().iter().any(|steps| {
            (root.value as i32 + steps).rem_euclid(OCTAVE as i32) == note.position_in_octave() as i32
        })
    }
}

impl fmt::Display for Intervals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.degrees.join(" "))
    }
}

/// Half-steps for a single degree token such as `5`, `b3` or `#11`.
pub fn half_steps(degree: &str) -> Result<i32> {
    let digits: String = degree.chars().filter(char::is_ascii_digit).collect();
    let number: u32 = digits
        .parse()
        .map_err(|_| StaccatoError::invalid("interval", degree))?;
    let base = DEGREE_HALF_STEPS
        .iter()
        .find(|(d, _)| *d == number)
        .map(|(_, steps)| *steps)
        .ok_or_else(|| StaccatoError::invalid("interval", degree))?;
    let delta: i32 = degree
        .chars()
        .map(|ch| match ch {
            'b' | 'B' => -1,
            '#' => 1,
            _ => 0,
        })
        .sum();
    Ok(base + delta)
}

fn degree_for_half_steps(steps: i32) -> Option<u32> {
    DEGREE_HALF_STEPS
        .iter()
        .find(|(_, s)| *s == steps)
        .map(|(d, _)| *d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degree_half_steps() {
        assert_eq!(half_steps("1").unwrap(), 0);
        assert_eq!(half_steps("b3").unwrap(), 3);
        assert_eq!(half_steps("#5").unwrap(), 8);
        assert_eq!(half_steps("13").unwrap(), 21);
        assert_eq!(half_steps("B7").unwrap(), 10);
    }

    #[test]
    fn unknown_degree_rejected() {
        assert!(half_steps("16").is_err());
        assert!(half_steps("b").is_err());
        assert!(Intervals::new("1 3 17").is_err());
        assert!(Intervals::new("").is_err());
    }

    #[test]
    fn pattern_half_steps() {
        let minor = Intervals::new("1 b3 5").unwrap();
        assert_eq!(minor.half_steps(), vec![0, 3, 7]);
        assert_eq!(minor.to_string(), "1 b3 5");
        assert_eq!(minor.len(), 3);
    }

    #[test]
    fn rotate_moves_degrees_left() {
        let mut intervals = Intervals::new("1 3 5 7").unwrap();
        intervals.rotate(1);
        assert_eq!(intervals.to_string(), "3 5 7 1");
        intervals.rotate(7);
        assert_eq!(intervals.to_string(), "1 3 5 7");
    }

    #[test]
    fn from_notes_spells_flats() {
        let notes = [Note::new(70), Note::new(61), Note::new(65)];
        assert_eq!(Intervals::from_notes(&notes).to_string(), "1 b3 5");
        let notes = [Note::new(60), Note::new(66)];
        assert_eq!(Intervals::from_notes(&notes).to_string(), "1 b5");
    }

    #[test]
    fn has_checks_pitch_class() {
        let major = Intervals::new("1 3 5").unwrap();
        let root = Note::new(60);
        assert!(major.has(&root, &Note::new(76)));
        assert!(!major.has(&root, &Note::new(63)));
    }
}

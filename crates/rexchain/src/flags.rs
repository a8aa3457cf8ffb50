use std::fmt;

/// Compile-time options of a pattern. Immutable once the graph is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Flags {
    /// `i`: literals, sets and backreferences compare case-folded characters.
    pub case_insensitive: bool,
    /// `m`: `^` and `$` also match around embedded newlines; `.` skips `\n`.
    pub multiline: bool,
    /// `f`: prefer cheap short-circuits (implies the fail-fast end check).
    pub optimize_speed: bool,
    /// `a`: only perform rewrites that keep the matched language exact.
    pub optimize_accuracy: bool,
    /// `u`: keep single-element non-capturing groups as groups.
    pub no_ungroup: bool,
    /// `x`: keep every literal character as its own node.
    pub no_expose: bool,
    /// `e`: reject inputs whose tail cannot match a fixed `literal$` ending.
    pub fail_fast: bool,
}

impl Flags {
    /// Flag letters in the order `Display` writes them.
    pub const LETTERS: &'static str = "imfauxe";

    /// Turn on the flag named by `letter`. Returns `false` for unknown letters.
    pub fn set_letter(&mut self, letter: char) -> bool {
        match letter {
            'i' => self.case_insensitive = true,
            'm' => self.multiline = true,
            'f' => self.optimize_speed = true,
            'a' => self.optimize_accuracy = true,
            'u' => self.no_ungroup = true,
            'x' => self.no_expose = true,
            'e' => self.fail_fast = true,
            _ => return false,
        }
        true
    }

    /// Union of two flag sets.
    pub fn merge(self, other: Flags) -> Flags {
        Flags {
            case_insensitive: self.case_insensitive || other.case_insensitive,
            multiline: self.multiline || other.multiline,
            optimize_speed: self.optimize_speed || other.optimize_speed,
            optimize_accuracy: self.optimize_accuracy || other.optimize_accuracy,
            no_ungroup: self.no_ungroup || other.no_ungroup,
            no_expose: self.no_expose || other.no_expose,
            fail_fast: self.fail_fast || other.fail_fast,
        }
    }

    /// Whether the fixed-end check runs. The accuracy hint cancels the
    /// check the speed hint would otherwise imply; an explicit `e` always wins.
    pub fn wants_fail_fast(&self) -> bool {
        self.fail_fast || (self.optimize_speed && !self.optimize_accuracy)
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set = [
            self.case_insensitive,
            self.multiline,
            self.optimize_speed,
            self.optimize_accuracy,
            self.no_ungroup,
            self.no_expose,
            self.fail_fast,
        ];
        for (letter, on) in Flags::LETTERS.chars().zip(set) {
            if on {
                write!(f, "{}", letter)?;
            }
        }
        Ok(())
    }
}

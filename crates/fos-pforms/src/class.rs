//! Character classification
//!
//! Every character a rule set knows about has a [`CharClass`]: it is either a
//! combining character, a plain letter, or a letter with presentation forms.

/// Kind of a classified character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharKind {
    /// Attaches to the preceding base character
    Combining,
    /// Letter with no special characteristics
    Miscellaneous,
    /// Letter with presentation forms
    Presentational,
}

/// Presentation form of a letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Form {
    Isolated = 0,
    Initial = 1,
    Medial = 2,
    Final = 3,
}

/// Classification of one character or range of characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    pub kind: CharKind,
    /// Presentation forms indexed by [`Form`], `None` when absent
    pub forms: [Option<u32>; 4],
}

/// Classification used for ligature results that are not classified
/// themselves: a letter with no forms
pub static MISCELLANEOUS: CharClass = CharClass {
    kind: CharKind::Miscellaneous,
    forms: [None; 4],
};

impl CharClass {
    /// Combining character
    pub fn combining() -> Self {
        Self { kind: CharKind::Combining, forms: [None; 4] }
    }

    /// Letter without presentation forms
    pub fn miscellaneous() -> Self {
        Self { kind: CharKind::Miscellaneous, forms: [None; 4] }
    }

    /// Letter with the given isolated, initial, medial and final forms
    pub fn presentational(forms: [Option<u32>; 4]) -> Self {
        Self { kind: CharKind::Presentational, forms }
    }

    pub fn is_combining(&self) -> bool {
        self.kind == CharKind::Combining
    }

    /// The requested form, if this is a presentational letter that has it
    pub fn form(&self, form: Form) -> Option<u32> {
        match self.kind {
            CharKind::Presentational => self.forms[form as usize],
            _ => None,
        }
    }

    pub fn has_form(&self, form: Form) -> bool {
        self.form(form).is_some()
    }

    /// Has a form that joins to the following letter
    pub fn joins_next(&self) -> bool {
        self.has_form(Form::Initial) || self.has_form(Form::Medial)
    }

    /// Has a form that joins to the preceding letter
    pub fn joins_prev(&self) -> bool {
        self.has_form(Form::Medial) || self.has_form(Form::Final)
    }
}

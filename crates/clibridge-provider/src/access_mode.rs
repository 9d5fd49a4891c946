use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
/// Permission tier granted to the assistant CLI for one invocation.
pub enum AccessMode {
    #[default]
    ReadOnly,
    WriteEdit,
    Full,
}

impl AccessMode {
    /// Stable short name, also used as the chat command that selects the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "safe",
            Self::WriteEdit => "write",
            Self::Full => "full",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ReadOnly => "Read only",
            Self::WriteEdit => "Write (Write + Edit)",
            Self::Full => "Full access",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

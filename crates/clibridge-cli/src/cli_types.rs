use clap::ValueEnum;

use clibridge_provider::AccessMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliAccessMode {
    Safe,
    Write,
    Full,
}

impl From<CliAccessMode> for AccessMode {
    fn from(value: CliAccessMode) -> Self {
        match value {
            CliAccessMode::Safe => AccessMode::ReadOnly,
            CliAccessMode::Write => AccessMode::WriteEdit,
            CliAccessMode::Full => AccessMode::Full,
        }
    }
}

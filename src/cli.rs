//! Process plumbing shared by the binaries.

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use crate::error::OmicsError;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn map_exit_code(error: &OmicsError) -> u8 {
    match error {
        OmicsError::Validation(_)
        | OmicsError::ConfigRead(_)
        | OmicsError::ConfigParse(_) => 2,
        OmicsError::Fetch { .. }
        | OmicsError::CgdsHttp(_)
        | OmicsError::CgdsStatus { .. }
        | OmicsError::HpaHttp(_)
        | OmicsError::HpaStatus { .. } => 3,
        OmicsError::Integrity(_) => 4,
        _ => 1,
    }
}

pub fn finish(result: miette::Result<()>) -> ExitCode {
    if let Err(report) = result {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<OmicsError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

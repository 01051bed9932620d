use std::io::Write;
use std::path::Path;

/// Record the gate result for later workflow steps.
///
/// Appends `approved=<bool>` to the step output file, or prints it to stdout
/// when there is none (running outside Actions).
pub fn write_approved(output_path: Option<&Path>, approved: bool) -> std::io::Result<()> {
    let line = format!("approved={approved}");
    match output_path {
        Some(path) => {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            writeln!(file, "{line}")
        }
        None => {
            println!("{line}");
            Ok(())
        }
    }
}

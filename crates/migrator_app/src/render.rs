use migrator_core::{AppViewModel, JobState, FALLBACK_PROJECT_NAME};

/// Status lines for the current view. Errors are returned as lines, never raised.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    if let Some(message) = &view.validation_message {
        lines.push(format!("error: {message}"));
    }

    let project = view.project_name.as_deref().unwrap_or(FALLBACK_PROJECT_NAME);
    match view.job_state {
        JobState::Idle => {
            if view.validation_message.is_none() {
                lines.push("Ready. Enter a repository URL.".to_string());
            }
        }
        JobState::Submitting => {
            lines.push(format!(
                "Migrating {project}... this can take several minutes."
            ));
        }
        JobState::Succeeded => match &view.artifact {
            Some(artifact) => lines.push(format!(
                "Migration of {project} complete: {} ({})",
                artifact.suggested_filename,
                format_bytes(artifact.byte_len)
            )),
            None => lines.push(format!("Migration of {project} complete.")),
        },
        JobState::Failed => {
            let message = view.error_message.as_deref().unwrap_or("Migration failed.");
            lines.push(format!("error: {message}"));
        }
    }

    lines
}

fn format_bytes(len: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    if len >= MIB {
        format!("{:.1} MiB", len as f64 / MIB as f64)
    } else if len >= KIB {
        format!("{:.1} KiB", len as f64 / KIB as f64)
    } else {
        format!("{len} bytes")
    }
}

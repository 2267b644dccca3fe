//! Content-based hashing for run IDs.

use lf_project::ControllerProject;
use sha2::{Digest, Sha256};

/// Run id: SHA-256 over the configuration and the start time.
pub fn compute_run_id(project: &ControllerProject, started_at: &str) -> String {
    let mut hasher = Sha256::new();

    let project_json = serde_json::to_string(project).unwrap_or_default();
    hasher.update(project_json.as_bytes());
    hasher.update(started_at.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_stability() {
        let project = ControllerProject::reference();
        let a = compute_run_id(&project, "2024-01-01T00:00:00+00:00");
        let b = compute_run_id(&project, "2024-01-01T00:00:00+00:00");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let project = ControllerProject::reference();
        let mut tuned = project.clone();
        tuned.loops[0].gains.kp = 0.1;

        let t = "2024-01-01T00:00:00+00:00";
        assert_ne!(compute_run_id(&project, t), compute_run_id(&tuned, t));
        assert_ne!(
            compute_run_id(&project, t),
            compute_run_id(&project, "2024-01-01T00:00:01+00:00")
        );
    }
}

//! Post-apply finalizers
//!
//! Bound from a `FinalizerDescription` and run by the apply session exactly
//! once after a successful apply. Failure here never flips the setting's
//! reported apply success; the session logs it and surfaces it separately.

use std::sync::Arc;

use prefsync_model::FinalizerDescription;
use tracing::debug;

use crate::adapters::Adapters;
use crate::error::FinalizeError;

pub enum SettingFinalizer {
    SystemParametersInfo {
        adapter: Arc<dyn crate::adapters::SystemParameters>,
        action: u32,
        send_change: bool,
        update_user_profile: bool,
    },
    ProcessRestart {
        process: Arc<dyn crate::adapters::ProcessManager>,
        exe_path: String,
    },
}

impl SettingFinalizer {
    pub fn bind(description: &FinalizerDescription, adapters: &Adapters) -> Self {
        match description {
            FinalizerDescription::SystemParametersInfo {
                action,
                send_change,
                update_user_profile,
            } => SettingFinalizer::SystemParametersInfo {
                adapter: Arc::clone(&adapters.system_parameters),
                action: *action,
                send_change: *send_change,
                update_user_profile: *update_user_profile,
            },
            FinalizerDescription::ProcessRestart { exe_path } => {
                SettingFinalizer::ProcessRestart {
                    process: Arc::clone(&adapters.process),
                    exe_path: exe_path.clone(),
                }
            }
        }
    }

    pub async fn run(&self) -> Result<(), FinalizeError> {
        match self {
            SettingFinalizer::SystemParametersInfo {
                adapter,
                action,
                send_change,
                update_user_profile,
            } => {
                debug!(action, "Broadcasting system parameter change");
                match adapter
                    .system_parameters_info(*action, *update_user_profile, *send_change)
                    .await
                {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(FinalizeError::Rejected),
                    Err(e) => Err(FinalizeError::Backend(e)),
                }
            }
            SettingFinalizer::ProcessRestart { process, exe_path } => {
                let running = process
                    .is_running(exe_path)
                    .await
                    .map_err(FinalizeError::Backend)?;
                if !running {
                    debug!(exe = %exe_path, "Process not running, restart skipped");
                    return Ok(());
                }
                let stopped = process.stop(exe_path).await.map_err(FinalizeError::Backend)?;
                if !stopped {
                    return Err(FinalizeError::Rejected);
                }
                let started = process.start(exe_path).await.map_err(FinalizeError::Backend)?;
                if started {
                    Ok(())
                } else {
                    Err(FinalizeError::Rejected)
                }
            }
        }
    }
}

//! Handler binding and dispatch
//!
//! A `HandlerDescription` is declarative data; `SettingHandler::bind` turns
//! it into the runtime variant holding the matching adapter. Dispatch is an
//! exhaustive match over the closed set of variants.

use prefsync_model::{HandlerDescription, Setting};
use serde_json::Value;

use crate::adapters::Adapters;
use crate::client::ClientHandler;
use crate::error::{ApplyError, BindError, CaptureError, Captured};
use crate::files::FilesHandler;
use crate::ini::IniHandler;
use crate::process::ProcessHandler;
use crate::registry::RegistryHandler;
use crate::system::SystemHandler;

/// Runtime handler for one setting, bound to its backend adapter.
pub enum SettingHandler {
    Registry(RegistryHandler),
    Ini(IniHandler),
    System(SystemHandler),
    Process(ProcessHandler),
    Files(FilesHandler),
    Client(ClientHandler),
}

impl SettingHandler {
    /// Bind a setting's description to the matching adapter.
    /// `existing_preference` seeds the client variant, whose value lives in
    /// the preferences document itself.
    pub fn bind(
        setting: &Setting,
        adapters: &Adapters,
        existing_preference: Option<Value>,
    ) -> Result<Self, BindError> {
        let description = setting.handler.as_ref().ok_or(BindError::NoHandler)?;
        Ok(match description {
            HandlerDescription::Registry {
                key_path,
                value_name,
                value_kind,
            } => SettingHandler::Registry(RegistryHandler::new(
                adapters.key_value.clone(),
                key_path.clone(),
                value_name.clone(),
                *value_kind,
                setting.kind,
            )),
            HandlerDescription::Ini {
                file_path,
                section,
                key,
            } => SettingHandler::Ini(IniHandler::new(
                adapters.ini.clone(),
                file_path.clone(),
                section.clone(),
                key.clone(),
                setting.kind,
            )),
            HandlerDescription::System { setting_id } => SettingHandler::System(
                SystemHandler::new(adapters.system.clone(), setting_id.clone(), setting.kind),
            ),
            HandlerDescription::Process { exe_path, .. } => SettingHandler::Process(
                ProcessHandler::new(adapters.process.clone(), exe_path.clone()),
            ),
            HandlerDescription::Files {
                root_path,
                patterns,
            } => SettingHandler::Files(FilesHandler::new(
                adapters.files.clone(),
                root_path.clone(),
                patterns.clone(),
            )),
            HandlerDescription::Client { .. } => {
                SettingHandler::Client(ClientHandler::new(existing_preference))
            }
        })
    }

    /// Read the current backend value. Never panics and never lets an
    /// adapter error escape as anything but a `CaptureError`.
    pub async fn capture(&self) -> Result<Captured, CaptureError> {
        match self {
            SettingHandler::Registry(h) => h.capture().await,
            SettingHandler::Ini(h) => h.capture().await,
            SettingHandler::System(h) => h.capture().await,
            SettingHandler::Process(h) => h.capture().await,
            SettingHandler::Files(h) => h.capture().await,
            SettingHandler::Client(h) => h.capture().await,
        }
    }

    /// Write a value to the backend.
    pub async fn apply(&self, value: &Value) -> Result<(), ApplyError> {
        match self {
            SettingHandler::Registry(h) => h.apply(value).await,
            SettingHandler::Ini(h) => h.apply(value).await,
            SettingHandler::System(h) => h.apply(value).await,
            SettingHandler::Process(h) => h.apply(value).await,
            SettingHandler::Files(h) => h.apply(value).await,
            SettingHandler::Client(h) => h.apply(value).await,
        }
    }
}

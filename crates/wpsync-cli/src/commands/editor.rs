use anyhow::Result;
use tracing::{debug, warn};

use wpsync_core::config::WpSyncConfig;
use wpsync_core::settings::{EditorSettings, JsonFileStore};

use crate::output::print_json;
use crate::EditorAction;

/// Execute an editor preferences command
pub fn execute(config: &WpSyncConfig, action: EditorAction) -> Result<()> {
    let store = JsonFileStore::open(config.settings_path())?;
    debug!("Editor settings at {}", store.path().display());
    let settings = EditorSettings::new(store, config.features);

    if let EditorAction::Set { visual, native } = action {
        if let Some(enabled) = visual {
            settings.set_visual_editor_enabled(enabled)?;
        }
        if let Some(enabled) = native {
            if !config.features.native_editor {
                warn!("The native editor feature is disabled; the preference has no effect");
            }
            settings.set_native_editor_enabled(enabled)?;
        }
    }

    print_json(&settings.preferences())
}

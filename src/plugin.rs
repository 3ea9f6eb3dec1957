use bevy::prelude::*;
use std::sync::Arc;

use crate::logging::LoggingPlugin;
use crate::pipeline::LoadedMap;

/// Hands a loaded map to the app as a read-only resource.
/// Brings in `LoggingPlugin` unless the app already has one.
pub struct MapCollidersPlugin {
    pub map: Arc<LoadedMap>,
}

impl MapCollidersPlugin {
    pub fn new(map: Arc<LoadedMap>) -> Self {
        Self { map }
    }
}

impl Plugin for MapCollidersPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<LoggingPlugin>() {
            app.add_plugins(LoggingPlugin::default());
        }
        app.insert_resource(MapCollidersResource(Arc::clone(&self.map)));
    }
}

#[derive(Resource)]
pub struct MapCollidersResource(pub Arc<LoadedMap>);

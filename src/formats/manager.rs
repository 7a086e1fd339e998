use crate::mesh::{MeshView, PolygonMesh};
use std::error::Error;
use std::sync::{Arc, Mutex, OnceLock};

pub trait MeshImporter: Send + Sync {
    fn name(&self) -> String;
    fn detect(&self, data: &[u8]) -> bool;
    fn read(&self, data: &[u8]) -> Result<PolygonMesh, Box<dyn Error>>;
}

pub trait MapExporter: Send + Sync {
    fn name(&self) -> String;
    fn extensions(&self) -> Vec<String>;
    fn write(&self, mesh: &dyn MeshView) -> Result<Vec<u8>, Box<dyn Error>>;
    fn write_with_settings(
        &self,
        mesh: &dyn MeshView,
        settings: Option<&str>,
    ) -> Result<Vec<u8>, Box<dyn Error>> {
        let _ = settings;
        self.write(mesh)
    }
    fn export_settings_schema(&self) -> Option<String> {
        None
    }
}

pub struct FormatManager {
    importers: Vec<Box<dyn MeshImporter>>,
    exporters: Vec<Box<dyn MapExporter>>,
}

impl Default for FormatManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatManager {
    pub fn new() -> Self {
        Self {
            importers: Vec::new(),
            exporters: Vec::new(),
        }
    }

    pub fn register_importer<I: MeshImporter + 'static>(&mut self, importer: I) {
        self.importers.push(Box::new(importer));
    }

    pub fn register_exporter<E: MapExporter + 'static>(&mut self, exporter: E) {
        self.exporters.push(Box::new(exporter));
    }

    pub fn detect_format(&self, data: &[u8]) -> Option<String> {
        self.importers
            .iter()
            .find(|importer| importer.detect(data))
            .map(|importer| importer.name())
    }

    pub fn read(&self, data: &[u8]) -> Result<PolygonMesh, Box<dyn Error>> {
        for importer in &self.importers {
            if importer.detect(data) {
                return importer.read(data);
            }
        }
        Err("Unknown or unsupported mesh format".into())
    }

    pub fn write(&self, format: &str, mesh: &dyn MeshView) -> Result<Vec<u8>, Box<dyn Error>> {
        self.write_with_settings(format, mesh, None)
    }

    pub fn write_with_settings(
        &self,
        format: &str,
        mesh: &dyn MeshView,
        settings: Option<&str>,
    ) -> Result<Vec<u8>, Box<dyn Error>> {
        match self.exporter(format) {
            Some(exporter) => exporter.write_with_settings(mesh, settings),
            None => Err(format!("Unsupported export format: {}", format).into()),
        }
    }

    /// Pick the exporter from the extension of `path`.
    pub fn write_auto(
        &self,
        path: &str,
        mesh: &dyn MeshView,
        settings: Option<&str>,
    ) -> Result<Vec<u8>, Box<dyn Error>> {
        let extension = std::path::Path::new(path)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        for exporter in &self.exporters {
            if exporter.extensions().contains(&extension) {
                return exporter.write_with_settings(mesh, settings);
            }
        }
        Err(format!("Could not determine format from extension: .{}", extension).into())
    }

    pub fn list_importers(&self) -> Vec<String> {
        self.importers.iter().map(|i| i.name()).collect()
    }

    pub fn list_exporters(&self) -> Vec<String> {
        self.exporters.iter().map(|e| e.name()).collect()
    }

    pub fn get_export_settings_schema(&self, format: &str) -> Option<String> {
        self.exporter(format)?.export_settings_schema()
    }

    fn exporter(&self, format: &str) -> Option<&dyn MapExporter> {
        self.exporters
            .iter()
            .find(|e| e.name().eq_ignore_ascii_case(format))
            .map(|e| e.as_ref())
    }
}

pub static MANAGER: OnceLock<Arc<Mutex<FormatManager>>> = OnceLock::new();

pub fn get_manager() -> Arc<Mutex<FormatManager>> {
    MANAGER
        .get_or_init(|| {
            let mut manager = FormatManager::new();
            manager.register_importer(crate::formats::obj::ObjFormat);
            manager.register_exporter(crate::formats::vxl::VxlFormat);
            Arc::new(Mutex::new(manager))
        })
        .clone()
}

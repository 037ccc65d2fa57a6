//! Ownership and visibility of compilations across pipelines.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use super::{PluginId, PluginSet};
use crate::config::Target;
use crate::utils::path::display_path;

/// What a requesting pipeline sees for a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The requester owns the file and builds it.
    Owned,
    /// Another pipeline owns the file; serve an inert stub.
    Excluded { owner: PluginId },
    /// A server pipeline owns the file and the requester is local; serve an
    /// aggregate module re-importing its local dependencies.
    ServerAggregate { owner: PluginId },
}

/// Decide how `requester` sees `path`.
///
/// With a single registered pipeline every file is owned.
pub fn resolve_scope(plugins: &PluginSet, requester: PluginId, path: &Path) -> Resolution {
    if !plugins.is_shared() {
        return Resolution::Owned;
    }
    let owner = plugins.owner(path);
    if owner.id == requester {
        return Resolution::Owned;
    }
    let requester_target = plugins
        .get(requester)
        .map_or(Target::Local, |record| record.target);
    if owner.target == Target::Server && requester_target == Target::Local {
        Resolution::ServerAggregate { owner: owner.id }
    } else {
        Resolution::Excluded { owner: owner.id }
    }
}

/// Inert module served in place of a file outside the requester's scope.
pub fn inert_stub(file: &Path, requester: &str) -> String {
    format!(
        "export default null;/*Removed {} file that is not in plugin scope the {}. */",
        js_string(&display_path(file)),
        js_string(requester)
    )
}

/// Aggregate module keeping the side effects of local dependencies.
pub fn server_stub(local_deps: &[PathBuf]) -> String {
    let mut code = String::new();
    for dep in local_deps {
        let _ = writeln!(code, "import {};", js_string(&display_path(dep)));
    }
    code.push_str("export default null;");
    code
}

/// JS string literal, also safe inside a block comment.
fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_string())
        .to_string()
        .replace("*/", "*\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::pipeline::Pipeline;
    use crate::testing::RecordingPipeline;
    use rustc_hash::FxHashMap;
    use std::sync::Arc;

    fn plugins() -> PluginSet {
        let mut client = PipelineConfig::new("client");
        client.main = true;
        client.scope = vec!["/client/".into()];
        let mut admin = PipelineConfig::new("admin");
        admin.scope = vec!["/admin/".into()];
        let mut server = PipelineConfig::new("server");
        server.scope = vec!["/server/".into()];
        server.target = Target::Server;

        let configs = [client, admin, server];
        let implementations: FxHashMap<String, Arc<dyn Pipeline>> = configs
            .iter()
            .map(|c| {
                let p: Arc<dyn Pipeline> = Arc::new(RecordingPipeline::new(&c.name));
                (c.name.clone(), p)
            })
            .collect();
        PluginSet::bind(&configs, implementations).unwrap()
    }

    #[test]
    fn test_resolution() {
        let set = plugins();
        let client = PluginId(0);
        let admin = PluginId(1);
        let server = PluginId(2);

        assert_eq!(
            resolve_scope(&set, client, Path::new("/client/A.es")),
            Resolution::Owned
        );
        assert_eq!(
            resolve_scope(&set, client, Path::new("/admin/A.es")),
            Resolution::Excluded { owner: admin }
        );
        assert_eq!(
            resolve_scope(&set, admin, Path::new("/client/A.es")),
            Resolution::Excluded { owner: client }
        );
        assert_eq!(
            resolve_scope(&set, client, Path::new("/server/Api.es")),
            Resolution::ServerAggregate { owner: server }
        );
        assert_eq!(
            resolve_scope(&set, server, Path::new("/client/A.es")),
            Resolution::Excluded { owner: client }
        );
    }

    #[test]
    fn test_inert_stub_names_file_and_requester() {
        let stub = inert_stub(Path::new("/admin/Panel.es"), "client");
        assert!(stub.starts_with("export default null;"));
        assert!(stub.contains("\"/admin/Panel.es\""));
        assert!(stub.contains("\"client\""));
    }

    #[test]
    fn test_server_stub() {
        let stub = server_stub(&[PathBuf::from("/client/a.es"), PathBuf::from("/client/b.es")]);
        assert_eq!(
            stub,
            "import \"/client/a.es\";\nimport \"/client/b.es\";\nexport default null;"
        );
        assert_eq!(server_stub(&[]), "export default null;");
    }

    #[test]
    fn test_stubs_escape_paths() {
        let stub = inert_stub(Path::new("/admin/we\"ird*/x.es"), "client");
        assert!(stub.contains(r#""/admin/we\"ird*\/x.es""#));
        assert_eq!(stub.matches("*/").count(), 1);
        assert!(stub.ends_with("*/"));

        let stub = server_stub(&[PathBuf::from("/client/a\"b.es")]);
        assert_eq!(stub, "import \"/client/a\\\"b.es\";\nexport default null;");
    }
}

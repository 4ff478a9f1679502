// src/core/synthesizer.rs

//! Drives the configurator lifecycle and renders the workspace into files.
//!
//! Rendering is pure: it turns the finalized tree into [`RenderedFile`]s and leaves
//! writing them to [`crate::system::writer`].

use crate::{
    constants::{GITIGNORE_FILENAME, NX_CONFIG_FILENAME, NX_PROJECT_FILENAME, TASKS_MANIFEST_FILENAME},
    core::{
        configurator::{LifecycleError, NxConfigurator},
        paths,
        workspace::{GeneratedFile, Project, Workspace},
    },
    models::Ecosystem,
};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while synthesizing a workspace.
#[derive(Error, Debug)]
pub enum SynthError {
    /// A lifecycle phase failed.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    /// A file could not be serialized.
    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A file ready to be written, with its path relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Path relative to the output directory.
    pub path: PathBuf,
    /// Full file contents.
    pub contents: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NxAffected<'a> {
    default_base: &'a str,
}

#[derive(Serialize)]
struct NxJson<'a> {
    extends: &'a str,
    affected: NxAffected<'a>,
}

#[derive(Serialize)]
struct TasksManifest<'a> {
    tasks: BTreeMap<&'a str, &'a crate::core::task::Task>,
    env: &'a BTreeMap<String, String>,
    /// Ecosystem settings, including the dependency metadata the graph binder attached.
    ecosystem: &'a Ecosystem,
}

/// Runs both lifecycle phases on the workspace and renders every file.
pub fn synthesize(
    workspace: &mut Workspace,
    configurator: &mut NxConfigurator,
) -> Result<Vec<RenderedFile>, SynthError> {
    configurator.pre_synthesize(workspace)?;
    configurator.synthesize(workspace)?;
    render(workspace)
}

/// Renders the finalized workspace. Files are ordered by project, then by path.
pub fn render(workspace: &Workspace) -> Result<Vec<RenderedFile>, SynthError> {
    let mut files = Vec::new();

    let nx_json = NxJson {
        extends: "nx/presets/npm.json",
        affected: NxAffected {
            default_base: &workspace.nx.default_base,
        },
    };
    files.push(json_file(PathBuf::from(NX_CONFIG_FILENAME), &serde_json::to_value(&nx_json)?)?);

    for id in workspace.ids() {
        let project = workspace.project(id);

        for (path, file) in project.files() {
            let path = project.outdir.join(path);
            match file {
                GeneratedFile::Json(value) => files.push(json_file(path, value)?),
                GeneratedFile::Text(text) => files.push(RenderedFile {
                    path,
                    contents: text.clone(),
                }),
            }
        }

        if let Some(value) = render_nx_project(workspace, project) {
            files.push(json_file(project.outdir.join(NX_PROJECT_FILENAME), &value)?);
        }

        let manifest = TasksManifest {
            tasks: project.tasks.iter().map(|t| (t.name(), t)).collect(),
            env: project.tasks.env(),
            ecosystem: &project.ecosystem,
        };
        files.push(json_file(
            project.outdir.join(TASKS_MANIFEST_FILENAME),
            &serde_json::to_value(&manifest)?,
        )?);

        if !project.gitignore().is_empty() {
            let mut contents = project.gitignore().join("\n");
            contents.push('\n');
            files.push(RenderedFile {
                path: project.outdir.join(GITIGNORE_FILENAME),
                contents,
            });
        }
    }

    log::debug!("Rendered {} file(s)", files.len());
    Ok(files)
}

/// The `project.json` of a graph participant; `None` for projects outside the graph.
fn render_nx_project(workspace: &Workspace, project: &Project) -> Option<Value> {
    let nx = project.nx()?;

    let mut targets = Map::new();
    for task in project.tasks.iter().filter(|t| !t.is_empty()) {
        let mut options = Map::new();
        options.insert("command".to_string(), Value::from(task.steps().join(" && ")));
        options.insert("cwd".to_string(), Value::from(paths::to_posix(&project.outdir)));
        let env = project.tasks.effective_env(task);
        if !env.is_empty() {
            options.insert("env".to_string(), json!(env));
        }
        targets.insert(
            task.name().to_string(),
            json!({ "executor": "nx:run-commands", "options": options }),
        );
    }

    Some(json!({
        "name": project.name,
        "root": paths::to_posix(&project.outdir),
        "implicitDependencies": nx.dependency_names(workspace),
        "targets": targets,
    }))
}

fn json_file(path: PathBuf, value: &Value) -> Result<RenderedFile, serde_json::Error> {
    let mut contents = serde_json::to_string_pretty(value)?;
    contents.push('\n');
    Ok(RenderedFile { path, contents })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        configurator::NxConfiguratorOptions,
        graph,
        task::TaskOptions,
        workspace::ProjectId,
    };
    use crate::models::{DepsManager, JavaSettings, MavenCoordinates, NodeSettings, PythonSettings};

    fn find<'a>(files: &'a [RenderedFile], path: &str) -> Option<&'a RenderedFile> {
        files.iter().find(|f| f.path == PathBuf::from(path))
    }

    #[test]
    fn test_render_writes_project_json_for_graph_participants() {
        let mut ws = Workspace::new("monorepo", Ecosystem::Other);
        let web = ws
            .add_project(ProjectId::ROOT, "web", "packages/web", Ecosystem::Node(NodeSettings::default()))
            .unwrap();
        ws.project_mut(web)
            .tasks
            .add_task(
                "build",
                TaskOptions {
                    exec: Some("tsc".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        let mut nx = NxConfigurator::attach(&mut ws, NxConfiguratorOptions::default()).unwrap();
        graph::ensure_graph_participation(&mut ws, web);
        graph::add_implicit_dependency(&mut ws, web, "codegen").unwrap();

        let files = synthesize(&mut ws, &mut nx).unwrap();

        let project_json = find(&files, "packages/web/project.json").unwrap();
        let value: Value = serde_json::from_str(&project_json.contents).unwrap();
        assert_eq!(value["name"], "web");
        assert_eq!(value["implicitDependencies"], json!(["codegen"]));
        assert_eq!(value["targets"]["build"]["options"]["command"], "tsc");

        assert!(find(&files, "project.json").is_none());
        assert!(find(&files, "package.json").is_some());
        let gitignore = find(&files, ".gitignore").unwrap();
        assert_eq!(gitignore.contents, ".nx/cache\n");
    }

    #[test]
    fn test_nx_json_carries_default_base() {
        let mut ws = Workspace::new("monorepo", Ecosystem::Other);
        let mut nx = NxConfigurator::attach(
            &mut ws,
            NxConfiguratorOptions {
                default_release_branch: Some("main".to_string()),
            },
        )
        .unwrap();
        let files = synthesize(&mut ws, &mut nx).unwrap();
        let nx_json: Value = serde_json::from_str(&find(&files, "nx.json").unwrap().contents).unwrap();
        assert_eq!(nx_json["affected"]["defaultBase"], "main");
    }

    #[test]
    fn test_tasks_manifest_lists_root_tasks() {
        let mut ws = Workspace::new("monorepo", Ecosystem::Other);
        let mut nx = NxConfigurator::attach(&mut ws, NxConfiguratorOptions::default()).unwrap();
        let files = synthesize(&mut ws, &mut nx).unwrap();
        let manifest: Value =
            serde_json::from_str(&find(&files, ".tasks.json").unwrap().contents).unwrap();
        assert_eq!(manifest["tasks"]["graph"]["steps"], json!(["npx nx graph"]));
        assert_eq!(manifest["tasks"]["run-many"]["receive_args"], true);
    }

    #[test]
    fn test_tasks_manifest_carries_dependency_metadata() {
        let mut ws = Workspace::new("monorepo", Ecosystem::Other);
        let java = |artifact: &str| {
            Ecosystem::Java(JavaSettings {
                coordinates: MavenCoordinates {
                    group_id: "com.acme".to_string(),
                    artifact_id: artifact.to_string(),
                    version: "0.1.0".to_string(),
                },
                ..Default::default()
            })
        };
        let python = |deps_manager| Ecosystem::Python(PythonSettings { deps_manager, ..Default::default() });
        let svc = ws.add_project(ProjectId::ROOT, "svc", "svc", java("svc")).unwrap();
        let model = ws.add_project(ProjectId::ROOT, "model", "model", java("model")).unwrap();
        let api = ws.add_project(ProjectId::ROOT, "api", "api", python(DepsManager::Poetry)).unwrap();
        let lib = ws.add_project(ProjectId::ROOT, "lib", "lib", python(DepsManager::Pip)).unwrap();
        let mut nx = NxConfigurator::attach(&mut ws, NxConfiguratorOptions::default()).unwrap();
        graph::ensure_project_graph(&mut ws);
        graph::add_java_dependency(&mut ws, svc, model).unwrap();
        graph::add_python_poetry_dependency(&mut ws, api, lib).unwrap();

        let files = synthesize(&mut ws, &mut nx).unwrap();

        let svc_manifest: Value =
            serde_json::from_str(&find(&files, "svc/.tasks.json").unwrap().contents).unwrap();
        assert_eq!(svc_manifest["ecosystem"]["kind"], "java");
        assert_eq!(svc_manifest["ecosystem"]["dependencies"], json!(["com.acme/model@0.1.0"]));
        assert_eq!(
            svc_manifest["ecosystem"]["repositories"],
            json!([{ "id": "model", "url": "file://../model/dist/java" }])
        );

        let api_manifest: Value =
            serde_json::from_str(&find(&files, "api/.tasks.json").unwrap().contents).unwrap();
        assert_eq!(api_manifest["ecosystem"]["deps_manager"], "poetry");
        assert_eq!(
            api_manifest["ecosystem"]["dependencies"],
            json!(["lib@{path=\"../lib\", develop=true}"])
        );
    }
}

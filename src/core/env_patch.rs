// src/core/env_patch.rs

//! Poetry environment isolation.
//!
//! A poetry workspace root exports `VIRTUAL_ENV`, and `poetry env info -p` reports
//! whatever `VIRTUAL_ENV` points at. Nested poetry projects would therefore resolve
//! the root's environment. The patch re-queries poetry with the inherited variable
//! removed and puts the result in front of `PATH`.

use crate::{
    constants::{PATH_VAR, POETRY_ENV_QUERY, VIRTUAL_ENV_VAR},
    core::workspace::{Project, ProjectId, SkipNone, Workspace},
    models::Ecosystem,
};

/// Patches the task environment of a poetry project. Returns `false` (and changes
/// nothing) for every other project.
pub fn patch_poetry_env(project: &mut Project) -> bool {
    if !project.ecosystem.uses_poetry() {
        return false;
    }
    log::debug!("Patching poetry environment of '{}'", project.name);
    project
        .tasks
        .add_environment(VIRTUAL_ENV_VAR, POETRY_ENV_QUERY);
    project.tasks.add_environment(
        PATH_VAR,
        format!("$(echo {}/bin:${})", POETRY_ENV_QUERY, PATH_VAR),
    );
    true
}

/// Applies [`patch_poetry_env`] to every Python project at or below `start`.
/// Returns the number of patched projects.
pub fn patch_python_projects(workspace: &mut Workspace, start: ProjectId) -> usize {
    let mut patched = 0;
    for id in workspace.descendants(start, &SkipNone) {
        let project = workspace.project_mut(id);
        if matches!(project.ecosystem, Ecosystem::Python(_)) && patch_poetry_env(project) {
            patched += 1;
        }
    }
    patched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DepsManager, JavaSettings, PythonSettings};

    fn poetry() -> Ecosystem {
        Ecosystem::Python(PythonSettings {
            deps_manager: DepsManager::Poetry,
            ..Default::default()
        })
    }

    #[test]
    fn test_poetry_project_gets_both_variables() {
        let mut ws = Workspace::new("root", Ecosystem::Other);
        let api = ws.add_project(ProjectId::ROOT, "api", "api", poetry()).unwrap();

        assert!(patch_poetry_env(ws.project_mut(api)));

        let env = ws.project(api).tasks.env();
        assert_eq!(
            env.get("VIRTUAL_ENV").map(String::as_str),
            Some("$(env -u VIRTUAL_ENV poetry env info -p || echo '')")
        );
        assert_eq!(
            env.get("PATH").map(String::as_str),
            Some("$(echo $(env -u VIRTUAL_ENV poetry env info -p || echo '')/bin:$PATH)")
        );
    }

    #[test]
    fn test_non_python_project_is_untouched() {
        let mut ws = Workspace::new("root", Ecosystem::Other);
        let app = ws
            .add_project(ProjectId::ROOT, "app", "app", Ecosystem::Java(JavaSettings::default()))
            .unwrap();

        assert!(!patch_poetry_env(ws.project_mut(app)));
        assert!(ws.project(app).tasks.env().is_empty());
    }

    #[test]
    fn test_pip_project_is_untouched() {
        let mut ws = Workspace::new("root", Ecosystem::Other);
        let lib = ws
            .add_project(ProjectId::ROOT, "lib", "lib", Ecosystem::Python(PythonSettings::default()))
            .unwrap();

        assert!(!patch_poetry_env(ws.project_mut(lib)));
        assert!(ws.project(lib).tasks.env().is_empty());
    }

    #[test]
    fn test_patch_reaches_nested_projects_and_root() {
        let mut ws = Workspace::new("root", poetry());
        let group = ws.add_project(ProjectId::ROOT, "group", "group", Ecosystem::Other).unwrap();
        let nested = ws.add_project(group, "nested", "group/nested", poetry()).unwrap();

        assert_eq!(patch_python_projects(&mut ws, ProjectId::ROOT), 2);
        assert!(ws.root().tasks.env().contains_key("VIRTUAL_ENV"));
        assert!(ws.project(group).tasks.env().is_empty());
        assert!(ws.project(nested).tasks.env().contains_key("PATH"));
    }
}

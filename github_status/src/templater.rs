use std::collections::BTreeMap;

use minijinja::{AutoEscape, Environment, UndefinedBehavior, Value};
use tracing::debug;

use crate::errors::{Result, StatusError};

pub const DEFAULT_REPO_URL_TEMPLATE: &str = "{{ app.spec.source.repoURL }}";
pub const DEFAULT_REVISION_TEMPLATE: &str = "{{ app.status.operationState.syncResult.revision }}";

/// The variables templates are rendered against.
pub type Vars = serde_json::Map<String, serde_json::Value>;

/// The commit status fields. As config, every field holds a template source. On a
/// notification, every field holds the rendered value.
#[derive(serde::Deserialize, serde::Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct GitHubNotification {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(rename = "targetURL", default, skip_serializing_if = "String::is_empty")]
    pub target_url: String,
    #[serde(rename = "repoURL", default, skip_serializing_if = "String::is_empty")]
    pub repo_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub revision: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub github: Option<GitHubNotification>,
}

/// Where a notification is sent. The status target is fully determined by the
/// payload, so this is carried along but not read.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Destination {
    pub service: String,
    pub recipient: String,
}

/// Named callbacks made available to all templates.
#[derive(Debug, Default, Clone)]
pub struct FuncMap(BTreeMap<String, Value>);

impl FuncMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback, usually built with [`Value::from_function`].
    pub fn insert(&mut self, name: impl Into<String>, func: Value) -> &mut Self {
        self.0.insert(name.into(), func);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    RepoUrl,
    Revision,
    State,
    Label,
    TargetUrl,
}

impl Field {
    /// Compile and execution order.
    const ALL: [Field; 5] = [
        Field::RepoUrl,
        Field::Revision,
        Field::State,
        Field::Label,
        Field::TargetUrl,
    ];

    fn str(&self) -> &'static str {
        match self {
            Self::RepoUrl => "repoURL",
            Self::Revision => "revision",
            Self::State => "state",
            Self::Label => "label",
            Self::TargetUrl => "targetURL",
        }
    }

    fn source<'a>(&self, config: &'a GitHubNotification) -> &'a str {
        match self {
            Self::RepoUrl if config.repo_url.is_empty() => DEFAULT_REPO_URL_TEMPLATE,
            Self::RepoUrl => &config.repo_url,
            Self::Revision if config.revision.is_empty() => DEFAULT_REVISION_TEMPLATE,
            Self::Revision => &config.revision,
            Self::State => &config.state,
            Self::Label => &config.label,
            Self::TargetUrl => &config.target_url,
        }
    }

    fn target<'a>(&self, github: &'a mut GitHubNotification) -> &'a mut String {
        match self {
            Self::RepoUrl => &mut github.repo_url,
            Self::Revision => &mut github.revision,
            Self::State => &mut github.state,
            Self::Label => &mut github.label,
            Self::TargetUrl => &mut github.target_url,
        }
    }
}

/// The five compiled status field templates of one notification definition.
///
/// Immutable once compiled, so a single instance can serve any number of
/// concurrent executions.
pub struct Templater {
    name: String,
    env: Environment<'static>,
}

impl Templater {
    /// Compile all field templates. The first template with a syntax error aborts
    /// the compilation and no templater is returned.
    pub fn compile(name: &str, funcs: &FuncMap, config: &GitHubNotification) -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);
        for (func_name, func) in &funcs.0 {
            env.add_global(func_name.clone(), func.clone());
        }
        for field in Field::ALL {
            env.add_template_owned(
                template_name(name, field),
                field.source(config).to_string(),
            )
            .map_err(|source| StatusError::Compile {
                field: field.str(),
                source,
            })?;
        }
        debug!(name, "compiled github status templates");
        Ok(Self {
            name: name.to_string(),
            env,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render all fields into the notification's status payload, allocating the
    /// payload if it is missing. The rendered values only replace the payload
    /// once every field rendered successfully.
    pub fn execute(&self, notification: &mut Notification, vars: &Vars) -> Result<()> {
        let github = notification.github.get_or_insert_with(Default::default);
        let mut rendered = GitHubNotification::default();
        for field in Field::ALL {
            *field.target(&mut rendered) = self.render(field, vars)?;
        }
        *github = rendered;
        Ok(())
    }

    fn render(&self, field: Field, vars: &Vars) -> Result<String> {
        let execute_err = |source| StatusError::Execute {
            field: field.str(),
            source,
        };
        self.env
            .get_template(&template_name(&self.name, field))
            .map_err(execute_err)?
            .render(vars)
            .map_err(execute_err)
    }
}

fn template_name(name: &str, field: Field) -> String {
    format!("{name}.{}", field.str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(value: serde_json::Value) -> Vars {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("vars must be an object"),
        }
    }

    fn app_vars() -> Vars {
        vars(serde_json::json!({
            "app": {
                "metadata": {"name": "guestbook"},
                "spec": {"source": {"repoURL": "https://x/y/z.git"}},
                "status": {"operationState": {"syncResult": {"revision": "0123abcd"}}},
            },
            "context": {"argocdUrl": "https://argocd.example.com"},
        }))
    }

    fn config() -> GitHubNotification {
        GitHubNotification {
            state: "success".to_string(),
            label: "continuous-delivery/{{ app.metadata.name }}".to_string(),
            target_url: "{{ context.argocdUrl }}/applications/{{ app.metadata.name }}"
                .to_string(),
            repo_url: String::new(),
            revision: String::new(),
        }
    }

    #[test]
    fn test_execute_populates_all_fields() {
        let templater = Templater::compile("on-sync", &FuncMap::new(), &config()).unwrap();
        let mut notification = Notification::default();
        templater.execute(&mut notification, &app_vars()).unwrap();
        assert_eq!(
            notification.github,
            Some(GitHubNotification {
                state: "success".to_string(),
                label: "continuous-delivery/guestbook".to_string(),
                target_url: "https://argocd.example.com/applications/guestbook".to_string(),
                repo_url: "https://x/y/z.git".to_string(),
                revision: "0123abcd".to_string(),
            })
        );
        assert_eq!(templater.name(), "on-sync");
    }

    #[test]
    fn test_explicit_templates_override_defaults() {
        let mut cfg = config();
        cfg.repo_url = "https://github.com/{{ org }}/{{ repo }}".to_string();
        cfg.revision = "{{ sha }}".to_string();
        let templater = Templater::compile("n", &FuncMap::new(), &cfg).unwrap();
        let mut v = app_vars();
        v.insert("org".to_string(), "o".into());
        v.insert("repo".to_string(), "r".into());
        v.insert("sha".to_string(), "abc123".into());
        let mut notification = Notification::default();
        templater.execute(&mut notification, &v).unwrap();
        let github = notification.github.unwrap();
        assert_eq!(github.repo_url, "https://github.com/o/r");
        assert_eq!(github.revision, "abc123");
    }

    #[test]
    fn test_funcs_are_available() {
        let mut funcs = FuncMap::new();
        funcs.insert(
            "shorten",
            Value::from_function(|s: String| s.chars().take(7).collect::<String>()),
        );
        let mut cfg = config();
        cfg.label = "deploy@{{ shorten(app.status.operationState.syncResult.revision) }}"
            .to_string();
        let templater = Templater::compile("n", &funcs, &cfg).unwrap();
        let mut notification = Notification::default();
        templater.execute(&mut notification, &app_vars()).unwrap();
        assert_eq!(notification.github.unwrap().label, "deploy@0123abc");
    }

    #[test]
    fn test_compile_error_names_field() {
        struct TestCase {
            cfg: GitHubNotification,
            field: &'static str,
        }
        let test_cases = vec![
            TestCase {
                cfg: GitHubNotification {
                    repo_url: "{{ app.spec".to_string(),
                    ..config()
                },
                field: "repoURL",
            },
            TestCase {
                cfg: GitHubNotification {
                    state: "{{ state".to_string(),
                    ..config()
                },
                field: "state",
            },
            TestCase {
                cfg: GitHubNotification {
                    target_url: "{% if %}".to_string(),
                    ..config()
                },
                field: "targetURL",
            },
            TestCase {
                // The first broken field in compile order wins.
                cfg: GitHubNotification {
                    revision: "{{".to_string(),
                    label: "{{".to_string(),
                    ..config()
                },
                field: "revision",
            },
        ];
        for case in test_cases {
            match Templater::compile("n", &FuncMap::new(), &case.cfg) {
                Err(StatusError::Compile { field, .. }) => assert_eq!(field, case.field),
                Err(e) => panic!("unexpected error {e}"),
                Ok(_) => panic!("expected compile error for {}", case.field),
            }
        }
    }

    #[test]
    fn test_execute_error_leaves_payload_untouched() {
        let mut cfg = config();
        cfg.label = "{{ missing.value }}".to_string();
        let templater = Templater::compile("n", &FuncMap::new(), &cfg).unwrap();

        let mut notification = Notification::default();
        match templater.execute(&mut notification, &app_vars()) {
            Err(StatusError::Execute { field, .. }) => assert_eq!(field, "label"),
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(notification.github, Some(GitHubNotification::default()));

        let previous = GitHubNotification {
            state: "pending".to_string(),
            ..Default::default()
        };
        let mut notification = Notification {
            message: String::new(),
            github: Some(previous.clone()),
        };
        assert!(templater.execute(&mut notification, &app_vars()).is_err());
        assert_eq!(notification.github, Some(previous));
    }

    #[test]
    fn test_default_repo_url_requires_app() {
        let templater = Templater::compile("n", &FuncMap::new(), &config()).unwrap();
        let mut notification = Notification::default();
        match templater.execute(&mut notification, &Vars::new()) {
            Err(StatusError::Execute { field, .. }) => assert_eq!(field, "repoURL"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_templater_is_shared_across_threads() {
        let templater =
            std::sync::Arc::new(Templater::compile("n", &FuncMap::new(), &config()).unwrap());
        let handles = (0..4)
            .map(|i| {
                let templater = templater.clone();
                std::thread::spawn(move || {
                    let mut v = app_vars();
                    v["app"]["metadata"]["name"] = format!("app-{i}").into();
                    let mut notification = Notification::default();
                    templater.execute(&mut notification, &v).unwrap();
                    notification.github.unwrap().label
                })
            })
            .collect::<Vec<_>>();
        for (i, h) in handles.into_iter().enumerate() {
            assert_eq!(h.join().unwrap(), format!("continuous-delivery/app-{i}"));
        }
    }
}

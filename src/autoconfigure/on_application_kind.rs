//! The application-kind filter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::autoconfigure::condition::{ConditionOutcome, ModuleFilter};
use crate::autoconfigure::metadata::{MetadataSource, CONDITIONAL_ON_APPLICATION_KIND};

/// What kind of application is being assembled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationKind {
    /// Not a web application.
    #[default]
    None,
    /// A blocking, servlet-style web application.
    Servlet,
    /// A reactive web application.
    Reactive,
}

impl fmt::Display for ApplicationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApplicationKind::None => "none",
            ApplicationKind::Servlet => "servlet",
            ApplicationKind::Reactive => "reactive",
        };
        f.write_str(name)
    }
}

impl FromStr for ApplicationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(ApplicationKind::None),
            "servlet" => Ok(ApplicationKind::Servlet),
            "reactive" => Ok(ApplicationKind::Reactive),
            other => Err(format!(
                "unknown application kind '{}' (expected none, servlet or reactive)",
                other
            )),
        }
    }
}

/// Rejects modules that need a different kind of application.
///
/// Metadata values are `any`, `servlet` and `reactive`; `any` accepts
/// every web kind but not [`ApplicationKind::None`].
#[derive(Debug, Clone, Copy)]
pub struct OnApplicationKindCondition {
    kind: ApplicationKind,
}

impl OnApplicationKindCondition {
    pub fn new(kind: ApplicationKind) -> Self {
        Self { kind }
    }

    fn outcome(&self, required: &str) -> ConditionOutcome {
        let required = required.trim().to_ascii_lowercase();
        let accepted = match required.as_str() {
            "any" => self.kind != ApplicationKind::None,
            "servlet" => self.kind == ApplicationKind::Servlet,
            "reactive" => self.kind == ApplicationKind::Reactive,
            other => {
                return ConditionOutcome::no_match(format!("unknown application kind '{}'", other))
            }
        };

        if accepted {
            ConditionOutcome::matched(format!("found {} application", self.kind))
        } else if required == "any" {
            ConditionOutcome::no_match("did not find reactive or servlet application")
        } else {
            ConditionOutcome::no_match(format!("did not find {} application", required))
        }
    }
}

impl ModuleFilter for OnApplicationKindCondition {
    fn name(&self) -> &str {
        "OnApplicationKindCondition"
    }

    fn get_outcomes(
        &self,
        modules: &[Option<String>],
        metadata: &dyn MetadataSource,
    ) -> Vec<Option<ConditionOutcome>> {
        modules
            .iter()
            .map(|module| {
                let required = metadata.read(module.as_deref()?, CONDITIONAL_ON_APPLICATION_KIND)?;
                Some(self.outcome(&required))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoconfigure::metadata::ModuleMetadataCache;

    const METADATA: &str = "\
any=
any.ConditionalOnApplicationKind=any
servlet=
servlet.ConditionalOnApplicationKind=SERVLET
reactive=
reactive.ConditionalOnApplicationKind=reactive
plain=
";

    fn matched(kind: ApplicationKind) -> Vec<Option<bool>> {
        let metadata = ModuleMetadataCache::from_properties(METADATA);
        let modules: Vec<Option<String>> = ["any", "servlet", "reactive", "plain"]
            .iter()
            .map(|m| Some(m.to_string()))
            .collect();
        OnApplicationKindCondition::new(kind)
            .get_outcomes(&modules, &metadata)
            .into_iter()
            .map(|o| o.map(|o| o.is_match()))
            .collect()
    }

    #[test]
    fn servlet_application() {
        assert_eq!(
            matched(ApplicationKind::Servlet),
            vec![Some(true), Some(true), Some(false), None]
        );
    }

    #[test]
    fn reactive_application() {
        assert_eq!(
            matched(ApplicationKind::Reactive),
            vec![Some(true), Some(false), Some(true), None]
        );
    }

    #[test]
    fn non_web_application() {
        assert_eq!(
            matched(ApplicationKind::None),
            vec![Some(false), Some(false), Some(false), None]
        );
    }

    #[test]
    fn parses_kind_names() {
        assert_eq!("Servlet".parse::<ApplicationKind>(), Ok(ApplicationKind::Servlet));
        assert!("desktop".parse::<ApplicationKind>().is_err());
        assert_eq!(ApplicationKind::Reactive.to_string(), "reactive");
    }
}

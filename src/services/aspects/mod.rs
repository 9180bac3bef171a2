//! Concrete aspect implementations.
//!
//! | Aspect             | Source                                | Apply |
//! |--------------------|---------------------------------------|-------|
//! | `npm-scripts`      | `package.json` `scripts`              | yes   |
//! | `current-pipeline` | marker files, then the East deployer  | no    |
//! | `license`          | license file, then `package.json`     | no    |

pub mod license;
pub mod npm_scripts;
pub mod package_json;
pub mod pipeline;

use std::sync::Arc;

pub use license::LicenseAspect;
pub use npm_scripts::{NpmScriptsAspect, ScriptCategory, ScriptsFingerprintData};
pub use pipeline::{CurrentPipelineAspect, EastLookup, PipelineFingerprintData, PipelineKind};

use crate::domain::models::ClassifierConfig;
use crate::domain::ports::Aspect;

/// Every built-in aspect, in registration order.
pub fn builtin_aspects(classifier: &ClassifierConfig) -> Vec<Arc<dyn Aspect>> {
    vec![
        Arc::new(LicenseAspect),
        Arc::new(NpmScriptsAspect::new()),
        Arc::new(CurrentPipelineAspect::with_east_marker(
            classifier.affirmative_marker.clone(),
        )),
    ]
}

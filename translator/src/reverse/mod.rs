//! XML Schema → PSM diagram.
//!
//! A schema is read into an intermediate tree ([`p_psm::PDiagram`]), post-processed and then
//! written into the project through a [`sink::ModelSink`].

pub mod engineering;
pub mod p_psm;
mod post_process;
pub mod sink;
pub mod xsd_to_psm;

use thiserror::Error;
use xcase_psm::{PsmDiagram, PsmProject, Ref};
use xcase_xsd::{ImportResolver, Schema, SchemaSet, XsdError};

use self::engineering::ReverseEngineering;
use self::sink::{create_diagram, CommandSink, ImportCommand, ProjectSink};
use self::xsd_to_psm::XsdToPsm;
use crate::config::{Config, ReverseOptions};
use crate::log::{Severities, TranslationLog};

#[derive(Debug, Error)]
pub enum ReverseError {
    #[error("failed to read the schema: {0}")]
    Xsd(#[from] XsdError),
}

#[derive(Debug)]
pub struct ImportResult {
    pub diagram: Ref<PsmDiagram>,
    pub log: TranslationLog,
    /// Set if the import was journaled and can be undone
    pub command: Option<ImportCommand>,
}

/// Imports XML Schema documents as new diagrams of a project.
#[derive(Default)]
pub struct XsdImporter {
    options: ReverseOptions,
    severities: Severities,
    resolvers: Vec<Box<dyn ImportResolver>>,
}

impl XsdImporter {
    pub fn new(options: ReverseOptions, severities: Severities) -> Self {
        Self {
            options,
            severities,
            resolvers: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.reverse, config.severities())
    }

    /// Adds a resolver for `xs:import` and `xs:include`; resolvers are tried in order.
    pub fn with_resolver(mut self, resolver: impl ImportResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    pub fn import_str(
        &self,
        project: &mut PsmProject,
        diagram_name: &str,
        text: &str,
    ) -> Result<ImportResult, ReverseError> {
        self.import_str_with_progress(project, diagram_name, text, &mut |_, _| {})
    }

    pub fn import_str_with_progress(
        &self,
        project: &mut PsmProject,
        diagram_name: &str,
        text: &str,
        progress: &mut dyn FnMut(usize, usize),
    ) -> Result<ImportResult, ReverseError> {
        let schema = Schema::parse(text)?;
        let resolvers: Vec<&dyn ImportResolver> =
            self.resolvers.iter().map(|resolver| resolver.as_ref()).collect();
        let set = SchemaSet::compile(schema, &resolvers)?;
        Ok(self.import_schema_set(project, diagram_name, &set, progress))
    }

    /// Imports an already compiled schema set. Problems of the schema are reported in the log.
    pub fn import_schema_set(
        &self,
        project: &mut PsmProject,
        diagram_name: &str,
        set: &SchemaSet,
        progress: &mut dyn FnMut(usize, usize),
    ) -> ImportResult {
        let mut log = TranslationLog::new(self.severities.clone());
        let tree = XsdToPsm::new(set, self.options, &mut log).process();
        tracing::debug!(
            "read {} classes from the schema of {diagram_name:?}",
            tree.classes_count
        );

        let target_namespace = set.target_namespace.clone();
        let before = self.options.use_commands.then(|| project.clone());
        let diagram = create_diagram(project, diagram_name, target_namespace.clone());
        let project_sink = ProjectSink::new(project, diagram);

        let command = match before {
            Some(before) => {
                let mut sink = CommandSink::new(project_sink);
                ReverseEngineering::generate_psm(
                    &tree,
                    &mut sink,
                    &mut log,
                    self.options.layout,
                    progress,
                );
                Some(ImportCommand::new(
                    before,
                    diagram_name.to_string(),
                    target_namespace,
                    sink.into_commands(),
                ))
            }
            None => {
                let mut sink = project_sink;
                ReverseEngineering::generate_psm(
                    &tree,
                    &mut sink,
                    &mut log,
                    self.options.layout,
                    progress,
                );
                None
            }
        };

        ImportResult {
            diagram,
            log,
            command,
        }
    }
}

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::{NoExpand, Regex};
use xcase_psm::{PsmClass, PsmDiagram, PsmProject, Ref};

use crate::log::{MessageId, TranslationLog};

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Name used for classes without a name
pub const EMPTY_NAME_PLACEHOLDER: &str = "Unnamed";

/// Produces the unique names of one translation run.
pub struct NamingSupport<'p> {
    project: &'p PsmProject,
    diagram: Ref<PsmDiagram>,
    replacement: String,
    used_names: HashSet<String>,
    type_names: HashMap<Ref<PsmClass>, String>,
    suggestions: HashMap<Ref<PsmClass>, String>,
    global_elements: HashSet<String>,
}

impl<'p> NamingSupport<'p> {
    pub fn new(project: &'p PsmProject, diagram: Ref<PsmDiagram>, replacement: &str) -> Self {
        Self {
            project,
            diagram,
            replacement: replacement.to_string(),
            used_names: HashSet::new(),
            type_names: HashMap::new(),
            suggestions: HashMap::new(),
            global_elements: HashSet::new(),
        }
    }

    /// Forgets every name handed out so far.
    pub fn initialize(&mut self) {
        self.used_names.clear();
        self.type_names.clear();
        self.suggestions.clear();
        self.global_elements.clear();
    }

    /// Replaces whitespace runs; leading and trailing whitespace is dropped.
    pub fn normalize<'a>(&self, name: &'a str) -> Cow<'a, str> {
        WHITESPACE.replace_all(name.trim(), NoExpand(&self.replacement))
    }

    /// Marks a name as taken, e.g. one derived from a type name.
    pub fn register(&mut self, name: impl Into<String>) {
        self.used_names.insert(name.into());
    }

    fn unique(used: &mut HashSet<String>, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut counter = 1;
        while used.contains(&candidate) {
            counter += 1;
            candidate = format!("{base}{counter}");
        }
        used.insert(candidate.clone());
        candidate
    }

    /// The namespace prefix under which classes of a referenced diagram are visible
    fn foreign_prefix(&self, class: &PsmClass) -> Option<&'p str> {
        if class.diagram == self.diagram {
            return None;
        }
        let project: &'p PsmProject = self.project;
        project
            .reference_between(self.diagram, class.diagram)
            .filter(|reference| reference.namespace().is_some())
            .map(|reference| reference.namespace_prefix.as_str())
    }

    /// The type name of a class, unique within the run. Asking twice for the same class yields the
    /// same name.
    pub fn translate_type_name(
        &mut self,
        class: Ref<PsmClass>,
        log: &mut TranslationLog,
    ) -> String {
        if let Some(name) = self.type_names.get(&class) {
            return name.clone();
        }
        let project: &'p PsmProject = self.project;
        let psm_class = project.get(class);
        let normalized = self.normalize(&psm_class.name).into_owned();
        let base = if normalized.is_empty() {
            log.add(
                MessageId::XsEmptyName,
                format!("a class without a name was translated as {EMPTY_NAME_PLACEHOLDER:?}"),
            );
            EMPTY_NAME_PLACEHOLDER.to_string()
        } else {
            normalized
        };

        let name = match self.foreign_prefix(psm_class) {
            // Foreign names live in another schema; they need no suffix here.
            Some(prefix) => format!("{prefix}:{base}"),
            None => Self::unique(&mut self.used_names, &base),
        };
        self.type_names.insert(class, name.clone());
        name
    }

    /// Pre-registers the name to be used for `class`.
    pub fn suggest(&mut self, class: Ref<PsmClass>, name: impl Into<String>) {
        let name = name.into();
        self.used_names.insert(name.clone());
        self.suggestions.insert(class, name);
    }

    pub fn name_for_complex_type(
        &mut self,
        class: Ref<PsmClass>,
        log: &mut TranslationLog,
    ) -> String {
        match self.suggestions.get(&class) {
            Some(name) => name.clone(),
            None => self.translate_type_name(class, log),
        }
    }

    /// A unique name for a global element declaration.
    pub fn name_for_global_element(&mut self, label: &str, log: &mut TranslationLog) -> String {
        let normalized = self.normalize(label).into_owned();
        if normalized != label {
            log.add(
                MessageId::XsElementNameNormalized,
                format!("element name {label:?} was normalized to {normalized:?}"),
            );
        }
        let name = Self::unique(&mut self.global_elements, &normalized);
        if name != normalized {
            log.add(
                MessageId::XsDuplicateRootElements,
                format!(
                    "several root elements are called {normalized:?}; one was renamed to {name:?}"
                ),
            );
        }
        name
    }
}

/// `{base}-c`
pub fn model_group_name(base: &str) -> String {
    format!("{base}-c")
}

/// `{base}-a`
pub fn attribute_group_name(base: &str) -> String {
    format!("{base}-a")
}

pub const OPTIONAL_GROUP_SUFFIX: &str = "-opt";

/// The optional variant of the attribute group called `normal`
pub fn optional_attribute_group_name(normal: &str) -> String {
    format!("{normal}{OPTIONAL_GROUP_SUFFIX}")
}

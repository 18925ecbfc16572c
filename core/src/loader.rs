//! Template source loading for the Tessera Templating Engine.
// Copyright (C) 2024  Frankie Baffa
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use {
    crate::{
        error::{
            Error,
            Result,
        },
        file::read_file,
        path::{
            clean_path,
            join_template_name,
            template_directory,
        },
    },
    std::{
        collections::HashMap,
        fmt::Debug,
        path::{
            Path,
            PathBuf,
        },
        sync::Arc,
    },
};

/// Resolves template names to sources.
///
/// A loader handed to a template by [`Loader::inherit`] resolves names
/// relative to that template, which is what `extends`, `include` and
/// `import` use.
pub
trait Loader: Debug + Send + Sync {
    /// The canonical name of the template `name` refers to.
    fn resolve(&self, name: &str) -> Result<String>;

    /// The source of a resolved template.
    fn read(&self, resolved: &str) -> Result<String>;

    /// A loader scoped to the resolved template.
    fn inherit(&self, resolved: &str) -> Result<Arc<dyn Loader>>;
}

/// Templates held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub
struct MemoryLoader {
    templates: Arc<HashMap<String, String>>,
}

impl MemoryLoader {
    pub
    fn new() -> Self {
        Self::default()
    }

    /// Add a template source.
    pub
    fn with<N: Into<String>, S: Into<String>>(mut self, name: N, source: S) -> Self {
        self.insert(name, source);
        self
    }

    pub
    fn insert<N: Into<String>, S: Into<String>>(&mut self, name: N, source: S) {
        Arc::make_mut(&mut self.templates).insert(name.into(), source.into());
    }
}

impl<N: Into<String>, S: Into<String>> FromIterator<(N, S)> for MemoryLoader {
    fn from_iter<I: IntoIterator<Item = (N, S)>>(iter: I) -> Self {
        Self {
            templates: Arc::new(iter.into_iter()
                .map(|(n, s)| (n.into(), s.into()))
                .collect()),
        }
    }
}

impl Loader for MemoryLoader {
    fn resolve(&self, name: &str) -> Result<String> {
        if self.templates.contains_key(name) {
            return Ok(name.to_owned());
        }

        Err(Error::TemplateNotFound(name.to_owned()))
    }

    fn read(&self, resolved: &str) -> Result<String> {
        self.templates.get(resolved)
            .cloned()
            .ok_or_else(|| Error::TemplateNotFound(resolved.to_owned()))
    }

    fn inherit(&self, _: &str) -> Result<Arc<dyn Loader>> {
        Ok(Arc::new(self.clone()))
    }
}

/// Templates read from disk beneath a root directory.
///
/// A name is looked up relative to the directory of the template that
/// refers to it first, then relative to the root.
#[derive(Debug, Clone)]
pub
struct FileSystemLoader {
    root: PathBuf,
    current: Option<PathBuf>,
}

impl FileSystemLoader {
    pub
    fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: clean_path(root),
            current: None,
        }
    }

    pub
    fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let mut candidates = Vec::with_capacity(2);
        if let Some(current) = &self.current {
            candidates.push(join_template_name(current, name));
        }
        candidates.push(join_template_name(&self.root, name));
        candidates
    }
}

impl Loader for FileSystemLoader {
    fn resolve(&self, name: &str) -> Result<String> {
        self.candidates(name)
            .into_iter()
            .find(|p| p.is_file())
            .map(|p| p.to_string_lossy().into_owned())
            .ok_or_else(|| Error::TemplateNotFound(name.to_owned()))
    }

    fn read(&self, resolved: &str) -> Result<String> {
        read_file(resolved)
    }

    fn inherit(&self, resolved: &str) -> Result<Arc<dyn Loader>> {
        Ok(Arc::new(Self {
            root: self.root.clone(),
            current: Some(template_directory(resolved)),
        }))
    }
}

//! The context logic of the Tessera Templating Engine.
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
        path::clean_path,
        value::Value,
    },
    indexmap::IndexMap,
    serde_json::{
        from_str as from_json_str,
        Map as JsonMap,
        Value as JsonValue,
    },
    std::{
        cell::RefCell,
        fmt::{
            Debug,
            Formatter,
            Result as FmtResult,
        },
        path::Path,
        rc::Rc,
    },
};

const SCOPESEP: char = '.';

/// A frame of variable bindings.
///
/// Frames form a tree where each child holds its parent strongly and a
/// parent never refers to its children. Lookups walk towards the root;
/// writes only ever touch the frame they are made on.
#[derive(Default)]
pub
struct Context {
    bindings: RefCell<IndexMap<String, Value>>,
    parent: Option<Rc<Context>>,
}

impl Context {
    /// An empty root frame.
    pub
    fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// A child frame of `self`.
    pub
    fn inherit(self: &Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            bindings: RefCell::new(IndexMap::new()),
            parent: Some(self.clone()),
        })
    }

    pub
    fn parent(&self) -> Option<&Rc<Context>> {
        self.parent.as_ref()
    }

    /// The value bound to `name` in this frame or the closest ancestor.
    pub
    fn get(&self, name: &str) -> Option<Value> {
        let mut frame = self;
        loop {
            if let Some(value) = frame.bindings.borrow().get(name) {
                return Some(value.clone());
            }

            match &frame.parent {
                Some(parent) => frame = parent,
                None => return None,
            }
        }
    }

    /// Whether `name` is bound in this frame or any ancestor.
    pub
    fn has(&self, name: &str) -> bool {
        let mut frame = self;
        loop {
            if frame.bindings.borrow().contains_key(name) {
                return true;
            }

            match &frame.parent {
                Some(parent) => frame = parent,
                None => return false,
            }
        }
    }

    /// Bind `name` in this frame, shadowing any ancestor binding.
    pub
    fn set<S: Into<String>, V: Into<Value>>(&self, name: S, value: V) {
        self.bindings.borrow_mut().insert(name.into(), value.into());
    }

    /// Bind every entry of `map` in this frame.
    pub
    fn extend<I: IntoIterator<Item = (String, Value)>>(&self, map: I) {
        self.bindings.borrow_mut().extend(map);
    }

    /// A copy of the bindings of this frame only.
    pub
    fn locals(&self) -> IndexMap<String, Value> {
        self.bindings.borrow().clone()
    }

    /// Every visible binding, nearer frames shadowing farther ones.
    pub
    fn flatten(&self) -> IndexMap<String, Value> {
        let mut frames = vec![ self, ];
        let mut frame = self;
        while let Some(parent) = &frame.parent {
            frames.push(parent);
            frame = parent;
        }

        let mut out = IndexMap::new();
        for frame in frames.into_iter().rev() {
            for (k, v) in frame.bindings.borrow().iter() {
                out.insert(k.clone(), v.clone());
            }
        }
        out
    }

    /// A root frame holding the entries of a JSON object.
    pub
    fn from_json(json: &JsonValue) -> Result<Rc<Self>> {
        let ctx = Self::new();
        ctx.read_json(json, "<json>")?;
        Ok(ctx)
    }

    fn read_json(&self, json: &JsonValue, origin: &str) -> Result<()> {
        let map = match json {
            JsonValue::Object(map) => map,
            _ => return Err(Error::NotAMap(origin.to_owned())),
        };

        self.extend(map.iter().map(|(k, v)| (k.clone(), Value::from(v))));
        Ok(())
    }

    fn read_internal<P: AsRef<Path>>(p: P, alias: Option<&str>) -> Result<JsonValue> {
        let p = clean_path(p);
        let file = read_file(&p)?;

        let mut properties = from_json_str::<JsonValue>(&file)
            .map_err(|e| Error::JsonParse(e, p.clone()))?;

        if !matches!(properties, JsonValue::Object(_)) {
            return Err(Error::NotAMap(p.display().to_string()));
        };

        if let Some(alias) = alias {
            for segment in alias.rsplit(SCOPESEP) {
                properties = JsonValue::Object({
                    let mut new_map = JsonMap::new();
                    new_map.insert(segment.to_owned(), properties);
                    new_map
                });
            }
        }

        Ok(properties)
    }

    /// A root frame holding the entries of a JSON object file.
    pub
    fn read<P: AsRef<Path>>(p: P) -> Result<Rc<Self>> {
        let ctx = Self::new();
        ctx.read_in(p)?;
        Ok(ctx)
    }

    /// Bind the entries of a JSON object file in this frame.
    pub
    fn read_in<P: AsRef<Path>>(&self, p: P) -> Result<()> {
        let props = Self::read_internal(&p, None)?;
        self.read_json(&props, &p.as_ref().display().to_string())
    }

    /// Bind a JSON object file under a dotted alias, so reading a file as
    /// `site.meta` binds `site` to `{ "meta": { ...file } }`.
    pub
    fn read_in_as<P: AsRef<Path>>(&self, p: P, alias: &str) -> Result<()> {
        let props = Self::read_internal(&p, Some(alias))?;
        self.read_json(&props, &p.as_ref().display().to_string())
    }
}

impl Debug for Context {
    fn fmt(&self, fmtr: &mut Formatter<'_>) -> FmtResult {
        fmtr.debug_struct("Context")
            .field("bindings", &self.bindings.borrow())
            .field("parent", &self.parent)
            .finish()
    }
}

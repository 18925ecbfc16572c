//! Path handling utility functions for the Tessera Templating Engine.
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

use std::path::{
    Component,
    Path,
    PathBuf,
};

/// Lexically normalize a path, folding `.` and `..` components.
pub(crate)
fn clean_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut out = Vec::new();

    for comp in path.as_ref().components() {
        match comp {
            Component::CurDir => (),
            Component::ParentDir => match out.last() {
                Some(Component::RootDir) => (),
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                None | Some(Component::CurDir) | Some(Component::ParentDir) |
                Some(Component::Prefix(_)) => out.push(comp),
            },
            comp => out.push(comp),
        }
    }

    if !out.is_empty() {
        out.iter().collect()
    }
    else {
        PathBuf::from(".")
    }
}

/// Join a template name onto a base directory. Absolute names are kept as
/// they are.
pub(crate)
fn join_template_name<B, N>(base: B, name: N) -> PathBuf
where
    B: AsRef<Path>,
    N: AsRef<Path>
{
    let name = name.as_ref();
    if name.is_absolute() {
        return clean_path(name);
    }

    clean_path(base.as_ref().join(name))
}

/// The directory a resolved template lives in.
pub(crate)
fn template_directory<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut dir: PathBuf = path.as_ref().into();
    if !dir.pop() {
        return PathBuf::from(".");
    }

    dir
}

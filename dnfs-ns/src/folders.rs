//! Per-session folder tree: CREATEFOLDER/VIEWFOLDER/MOVE/UPMOVE/OPEN/
//! OPENPARENT (§4.2). Session-local only; never persisted, never
//! touches the file map or SS content.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Root,
    Folder,
    /// Bookkeeping placeholder created alongside a successful CREATE so
    /// MOVE/UPMOVE have something to relocate; not authoritative storage.
    FileStub,
}

struct Node {
    name: String,
    kind: NodeKind,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// A session's private folder tree, rooted at a node named `ROOT`.
pub struct FolderTree {
    nodes: Vec<Node>,
    root: usize,
    cwd: usize,
}

impl FolderTree {
    pub fn new() -> Self {
        let root = Node { name: "ROOT".to_string(), kind: NodeKind::Root, parent: None, children: Vec::new() };
        Self { nodes: vec![root], root: 0, cwd: 0 }
    }

    fn child_named(&self, parent: usize, name: &str) -> Option<usize> {
        self.nodes[parent].children.iter().copied().find(|&c| self.nodes[c].name == name)
    }

    /// CREATEFOLDER: adds a folder under the current directory.
    pub fn create_folder(&mut self, name: &str) -> Result<()> {
        if name == "ROOT" {
            return Err(Error::ReservedName);
        }
        if self.child_named(self.cwd, name).is_some() {
            return Err(Error::NameCollision);
        }
        let idx = self.nodes.len();
        self.nodes.push(Node {
            name: name.to_string(),
            kind: NodeKind::Folder,
            parent: Some(self.cwd),
            children: Vec::new(),
        });
        self.nodes[self.cwd].children.push(idx);
        Ok(())
    }

    /// Registers a file-stub placeholder in the current directory,
    /// called after a successful CREATE on the NS file map.
    pub fn add_file_stub(&mut self, filename: &str) -> Result<()> {
        if self.child_named(self.cwd, filename).is_some() {
            return Err(Error::NameCollision);
        }
        let idx = self.nodes.len();
        self.nodes.push(Node {
            name: filename.to_string(),
            kind: NodeKind::FileStub,
            parent: Some(self.cwd),
            children: Vec::new(),
        });
        self.nodes[self.cwd].children.push(idx);
        Ok(())
    }

    /// VIEWFOLDER [path]: lists the names of children of the current
    /// directory, or of `path` resolved relative to it.
    pub fn view_folder(&self, path: Option<&str>) -> Result<Vec<String>> {
        let mut at = self.cwd;
        if let Some(path) = path {
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                at = self.child_named(at, segment).ok_or(Error::FolderNotFound)?;
            }
        }
        Ok(self.nodes[at].children.iter().map(|&c| self.nodes[c].name.clone()).collect())
    }

    /// MOVE <dir>: enters `dir`, a child folder of the current directory.
    pub fn enter(&mut self, dirname: &str) -> Result<()> {
        let idx = self.child_named(self.cwd, dirname).ok_or(Error::FolderNotFound)?;
        if self.nodes[idx].kind != NodeKind::Folder {
            return Err(Error::FolderNotFound);
        }
        self.cwd = idx;
        Ok(())
    }

    /// OPEN [-c] <dir>: like [`Self::enter`], creating `dir` first when
    /// `create_if_missing` is set and it does not yet exist.
    pub fn open(&mut self, dirname: &str, create_if_missing: bool) -> Result<()> {
        if self.child_named(self.cwd, dirname).is_none() {
            if create_if_missing {
                self.create_folder(dirname)?;
            } else {
                return Err(Error::FolderMissingNoCreate);
            }
        }
        self.enter(dirname)
    }

    /// UPMOVE / OPENPARENT: moves the current directory pointer to its
    /// parent; fails if already at root.
    pub fn up(&mut self) -> Result<()> {
        match self.nodes[self.cwd].parent {
            Some(parent) => {
                self.cwd = parent;
                Ok(())
            }
            None => Err(Error::AlreadyAtRoot),
        }
    }

    /// MOVE <file> <dir>: relocates a file-stub from the current
    /// directory into a named sibling folder.
    pub fn move_file(&mut self, filename: &str, dirname: &str) -> Result<()> {
        let stub = self.child_named(self.cwd, filename).ok_or(Error::FileNotFound)?;
        if self.nodes[stub].kind != NodeKind::FileStub {
            return Err(Error::FileNotFound);
        }
        let target = self.child_named(self.cwd, dirname).ok_or(Error::FolderNotFound)?;
        if self.nodes[target].kind != NodeKind::Folder {
            return Err(Error::FolderNotFound);
        }
        self.nodes[self.cwd].children.retain(|&c| c != stub);
        self.nodes[target].children.push(stub);
        self.nodes[stub].parent = Some(target);
        Ok(())
    }

    /// UPMOVE <file>: relocates a file-stub from the current directory
    /// into its parent.
    pub fn upmove_file(&mut self, filename: &str) -> Result<()> {
        let parent = self.nodes[self.cwd].parent.ok_or(Error::AlreadyAtRoot)?;
        let stub = self.child_named(self.cwd, filename).ok_or(Error::FileNotFound)?;
        if self.nodes[stub].kind != NodeKind::FileStub {
            return Err(Error::FileNotFound);
        }
        self.nodes[self.cwd].children.retain(|&c| c != stub);
        self.nodes[parent].children.push(stub);
        self.nodes[stub].parent = Some(parent);
        Ok(())
    }
}

impl Default for FolderTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_root_name_is_rejected() {
        let mut tree = FolderTree::new();
        assert!(matches!(tree.create_folder("ROOT"), Err(Error::ReservedName)));
    }

    #[test]
    fn duplicate_folder_name_collides() {
        let mut tree = FolderTree::new();
        tree.create_folder("docs").unwrap();
        assert!(matches!(tree.create_folder("docs"), Err(Error::NameCollision)));
    }

    #[test]
    fn enter_and_upmove_round_trip() {
        let mut tree = FolderTree::new();
        tree.create_folder("docs").unwrap();
        tree.enter("docs").unwrap();
        assert_eq!(tree.view_folder(None).unwrap(), Vec::<String>::new());
        tree.up().unwrap();
        assert!(matches!(tree.up(), Err(Error::AlreadyAtRoot)));
    }

    #[test]
    fn open_without_create_flag_fails_on_missing_folder() {
        let mut tree = FolderTree::new();
        assert!(matches!(tree.open("missing", false), Err(Error::FolderMissingNoCreate)));
        tree.open("missing", true).unwrap();
        assert_eq!(tree.view_folder(None).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn move_file_relocates_stub_between_siblings() {
        let mut tree = FolderTree::new();
        tree.add_file_stub("a.txt").unwrap();
        tree.create_folder("docs").unwrap();
        tree.move_file("a.txt", "docs").unwrap();
        tree.enter("docs").unwrap();
        assert_eq!(tree.view_folder(None).unwrap(), vec!["a.txt".to_string()]);
    }
}

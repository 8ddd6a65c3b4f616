use std::any::type_name;

/// Human-readable identity of the code that handles a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerIdentity {
    pub module: String,
    pub name: String,
}

impl HandlerIdentity {
    /// Fully dotted path (`blog.views.raw`), used when a route carries no
    /// explicit name and no matched path.
    pub fn dotted(&self) -> String {
        format!("{}.{}", self.module.replace("::", "."), self.name)
    }
}

/// Reference to the handler about to run, as seen at dispatch.
///
/// A function handler is identified by the function itself, an object
/// handler by its type. Both are resolved from compiler-provided type paths
/// such as `blog::views::ArticleDetailView`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerRef {
    Function { path: &'static str },
    Object { type_name: &'static str },
}

impl HandlerRef {
    /// Reference a plain async fn (or closure) handler.
    pub fn function<F>(_handler: &F) -> Self {
        Self::Function {
            path: type_name::<F>(),
        }
    }

    /// Reference an object handler through its type.
    pub fn object<T: ?Sized>(_view: &T) -> Self {
        Self::Object {
            type_name: type_name::<T>(),
        }
    }

    /// Split the referenced path into `(module, name)`.
    ///
    /// `None` when the path has no module part or an empty segment; such a
    /// handler is not timed.
    pub fn identity(&self) -> Option<HandlerIdentity> {
        let path = match *self {
            Self::Function { path } => path,
            Self::Object { type_name } => type_name,
        };
        // Generic arguments are not part of the identity.
        let path = path.split('<').next().unwrap_or(path);
        let (module, name) = path.rsplit_once("::")?;
        if module.is_empty() || name.is_empty() {
            return None;
        }
        Some(HandlerIdentity {
            module: module.to_owned(),
            name: name.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod blog {
        pub mod views {
            pub const MODULE: &str = module_path!();

            pub struct ArticleDetailView;

            pub struct Paginated<T>(pub T);

            pub async fn list_articles() {}
        }
    }

    #[test]
    fn function_handler_uses_the_function() {
        let id = HandlerRef::function(&blog::views::list_articles)
            .identity()
            .expect("resolvable");
        assert_eq!(id.module, blog::views::MODULE);
        assert_eq!(id.name, "list_articles");
    }

    #[test]
    fn object_handler_uses_its_type() {
        let id = HandlerRef::object(&blog::views::ArticleDetailView)
            .identity()
            .expect("resolvable");
        assert_eq!(id.module, blog::views::MODULE);
        assert_eq!(id.name, "ArticleDetailView");
        assert!(id.dotted().ends_with(".blog.views.ArticleDetailView"));
        assert!(!id.dotted().contains("::"));
    }

    #[test]
    fn generic_arguments_are_dropped() {
        let id = HandlerRef::object(&blog::views::Paginated(1u8))
            .identity()
            .expect("resolvable");
        assert_eq!(id.name, "Paginated");
    }

    #[test]
    fn path_without_module_is_unresolvable() {
        assert_eq!(HandlerRef::object(&5u32).identity(), None);
        assert_eq!(HandlerRef::Function { path: "::orphan" }.identity(), None);
        assert_eq!(HandlerRef::Object { type_name: "views::" }.identity(), None);
    }
}

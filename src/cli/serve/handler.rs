//! Content producers for each route family.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use super::path::sanitize;
use super::route::{INIT_PATH, Route, Router};
use crate::config::ServerConfig;
use crate::pipeline::{
    CustomOptions, Pipeline, PipelineError, Prepared, Produced, ResponseOptions, cache_key,
};
use crate::stream::{self, ByteStream};
use crate::utils::mime::{self, types};

/// Shared state for request workers.
pub struct ServeContext {
    pub config: Arc<ServerConfig>,
    pub pipeline: Pipeline,
    pub router: Router,
}

impl ServeContext {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self {
            pipeline: Pipeline::from_config(&config),
            router: Router::new(&config.serve, &config.resolver.modules_dir),
            config,
        }
    }

    fn static_file(&self, rel: &str) -> PathBuf {
        sanitize(&self.config.serve.static_dir, rel)
    }
}

/// Run the pipeline for a matched route.
pub async fn prepare(
    ctx: &ServeContext,
    route: &Route<'_>,
    variant: u32,
) -> Result<Prepared, PipelineError> {
    let custom = CustomOptions { variant };

    match route {
        Route::Index => {
            let index = ctx.config.serve.index.to_string_lossy();
            let path = ctx.static_file(&index);
            let opts = ResponseOptions::new(types::HTML).variant(variant);
            let key = cache_key("/", &custom);
            ctx.pipeline
                .prepare_response(&key, &opts, || file_source(path))
                .await
        }
        Route::Static { rel } => {
            let path = ctx.static_file(rel);
            let opts = ResponseOptions::new(mime::from_path(&path)).variant(variant);
            let key = cache_key(&format!("/static/{rel}"), &custom);
            ctx.pipeline
                .prepare_response(&key, &opts, || file_source(path))
                .await
        }
        Route::Lib { lib, rel } => {
            let path = lib.file(rel);
            let opts = ResponseOptions::new(mime::from_path(&path))
                .deny_path_replace(lib.config.deny_path_replace)
                .minify(lib.config.minify)
                .variant(variant);
            let request_path = if rel.is_empty() {
                format!("/{}", lib.prefix)
            } else {
                format!("/{}/{}", lib.prefix, rel)
            };
            let key = cache_key(&request_path, &custom);
            ctx.pipeline
                .prepare_response(&key, &opts, || file_source(path))
                .await
        }
        Route::Element { route, name } => {
            let module = route.module(name);
            let theme = route.theme(name);
            let opts = ResponseOptions::new(types::JAVASCRIPT).variant(variant);
            let key = cache_key(&format!("/{}/{}.js", route.prefix, name), &custom);
            ctx.pipeline
                .prepare_response(&key, &opts, || element_source(module, theme, name.clone()))
                .await
        }
        Route::Init => {
            let files = ctx.config.serve.init_files.clone();
            let opts = ResponseOptions::new(types::JAVASCRIPT).variant(variant);
            let key = cache_key(INIT_PATH, &custom);
            ctx.pipeline
                .prepare_response(&key, &opts, || init_source(files))
                .await
        }
    }
}

fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Stream a file, or `None` when it does not exist.
async fn open_file(path: PathBuf) -> io::Result<Option<ByteStream>> {
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => Ok(Some(stream::file(path))),
        Ok(_) => Ok(None),
        Err(e) if is_missing(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

async fn file_source(path: PathBuf) -> io::Result<Option<Produced>> {
    Ok(open_file(path).await?.map(Produced::from))
}

/// Element module followed by its theme patch, if a theme sheet exists.
async fn element_source(
    module: PathBuf,
    theme: Option<PathBuf>,
    name: String,
) -> io::Result<Option<Produced>> {
    let Some(module) = open_file(module).await? else {
        return Ok(None);
    };

    let css = match theme {
        Some(path) => match tokio::fs::read_to_string(&path).await {
            Ok(css) => Some(css),
            Err(e) if is_missing(&e) => None,
            Err(e) => return Err(e),
        },
        None => None,
    };

    let body = match css {
        Some(css) => stream::concat(vec![module, stream::once(theme_patch(&name, &css))]),
        None => module,
    };
    Ok(Some(Produced::from(body)))
}

/// Configured init files, concatenated in order.
async fn init_source(files: Vec<PathBuf>) -> io::Result<Option<Produced>> {
    if files.is_empty() {
        return Ok(None);
    }
    let sources = files.into_iter().map(|file| stream::file(file)).collect();
    Ok(Some(Produced::from(stream::concat(sources))))
}

/// Script that appends the rules of `css` to the element's static stylesheet
/// once the element is defined.
fn theme_patch(name: &str, css: &str) -> String {
    let name = escape_template(name);
    let css = escape_template(css);
    format!(
        "\ncustomElements.whenDefined(`{name}`).then(() => {{\n\
         \x20   const sheet = customElements.get(`{name}`).css;\n\
         \x20   const theme = new CSSStyleSheet();\n\
         \x20   theme.replaceSync(`{css}`);\n\
         \x20   for (const rule of theme.cssRules) {{\n\
         \x20       sheet.insertRule(rule.cssText, sheet.cssRules.length);\n\
         \x20   }}\n\
         }});\n"
    )
}

/// Escape text for use inside a JavaScript template literal.
fn escape_template(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ElementsConfig, LibConfig};
    use crate::pipeline::MinifyPolicy;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn context(root: &Path) -> ServeContext {
        let mut config = ServerConfig::default();
        config.root = root.to_path_buf();
        config.resolver.modules_dir = root.join("node_modules");
        config.serve.static_dir = root.join("static");
        config.serve.init_files = vec![root.join("init/a.js"), root.join("init/b.js")];
        config.serve.libs = vec![
            LibConfig {
                route: "lit".into(),
                ..LibConfig::default()
            },
            LibConfig {
                route: "raw".into(),
                path: Some(root.join("raw")),
                deny_path_replace: true,
                minify: MinifyPolicy::Deny,
                ..LibConfig::default()
            },
        ];
        config.serve.elements = vec![ElementsConfig {
            route: "components".into(),
            dir: root.join("components"),
            theme_dir: Some(root.join("theme")),
        }];
        ServeContext::new(Arc::new(config))
    }

    async fn fetch(ctx: &ServeContext, path: &str) -> Prepared {
        let route = ctx.router.route(path).expect("route");
        prepare(ctx, &route, 0).await.expect("prepare")
    }

    fn text(prepared: &Prepared) -> String {
        match prepared {
            Prepared::Found { body, .. } => String::from_utf8(body.to_vec()).unwrap(),
            Prepared::NotFound => panic!("expected a body"),
        }
    }

    #[tokio::test]
    async fn test_index_and_static() {
        let dir = TempDir::new().unwrap();
        write(
            &dir.path().join("static/_index.html"),
            r#"<script type="module" src="app/main"></script>"#,
        );
        write(&dir.path().join("static/site.css"), "body{}");
        let ctx = context(dir.path());

        let index = fetch(&ctx, "/").await;
        assert_eq!(text(&index), r#"<script type="module" src="/app/main.js"></script>"#);
        assert_eq!(index.headers().unwrap()["Content-Type"], types::HTML);

        let css = fetch(&ctx, "/static/site.css").await;
        assert_eq!(text(&css), "body{}");
        assert_eq!(css.headers().unwrap()["Content-Type"], types::CSS);
    }

    #[tokio::test]
    async fn test_lib_files() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("node_modules/lit/index.js"), "export * from './core';");
        write(&dir.path().join("raw/x.js"), "export * from './core';");
        let ctx = context(dir.path());

        assert_eq!(text(&fetch(&ctx, "/lit/index.js").await), "export * from './core.js';");
        assert_eq!(text(&fetch(&ctx, "/raw/x.js").await), "export * from './core';");
        assert!(fetch(&ctx, "/lit/missing.js").await.is_not_found());
        assert!(fetch(&ctx, "/lit/").await.is_not_found());
    }

    #[tokio::test]
    async fn test_element_with_theme() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("components/nf-button.js"), "export class Button {}");
        write(&dir.path().join("components/nf-plain.js"), "export class Plain {}");
        write(&dir.path().join("theme/nf-button.css"), ":host { content: `x`; }");
        let ctx = context(dir.path());

        let themed = text(&fetch(&ctx, "/components/nf-button.js").await);
        assert!(themed.starts_with("export class Button {}\ncustomElements.whenDefined(`nf-button`)"));
        assert!(themed.contains(r":host { content: \`x\`; }"));

        let plain = text(&fetch(&ctx, "/components/nf-plain.js").await);
        assert_eq!(plain, "export class Plain {}");

        assert!(fetch(&ctx, "/components/absent.js").await.is_not_found());
    }

    #[tokio::test]
    async fn test_init_concatenates_in_order() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("init/a.js"), "import './first';\n");
        write(&dir.path().join("init/b.js"), "import './second';\n");
        let ctx = context(dir.path());

        let init = fetch(&ctx, INIT_PATH).await;
        assert_eq!(text(&init), "import './first.js';\nimport './second.js';\n");
    }

    #[tokio::test]
    async fn test_init_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("init/a.js"), "first");
        let ctx = context(dir.path());

        let route = ctx.router.route(INIT_PATH).unwrap();
        let err = prepare(&ctx, &route, 0).await.unwrap_err();
        assert!(matches!(err, PipelineError::Producer(_)));
    }

    #[test]
    fn test_escape_template() {
        assert_eq!(escape_template(r"a\b`c${d}"), r"a\\b\`c\${d}");
    }
}

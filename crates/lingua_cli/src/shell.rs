//! Interactive shell state and command dispatch.
//!
//! # Responsibility
//! - Own the store, session context, and collaborators for one run.
//! - Map each `Command` onto a session handler and report the outcome.
//!
//! # Invariants
//! - `execute` never panics; every failure becomes a `ShellResponse` with
//!   `ok = false`.

use crate::commands::{Command, ImageFormat, HELP};
use lingua_core::config::RenderConfig;
use lingua_core::enrich::Enricher;
use lingua_core::graph::neighborhood::RefDirection;
use lingua_core::session::{self, AddTermRequest, SessionContext};
use lingua_core::{ConceptStore, DocumentRepository, GraphRenderer, PngRenderer, SvgRenderer};
use log::warn;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Outcome envelope printed after each command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellResponse {
    pub ok: bool,
    pub message: String,
    pub quit: bool,
}

impl ShellResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            quit: false,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            quit: false,
        }
    }
}

pub struct Shell<R: DocumentRepository> {
    store: ConceptStore<R>,
    ctx: SessionContext,
    enricher: Box<dyn Enricher>,
    render: RenderConfig,
}

impl<R: DocumentRepository> Shell<R> {
    pub fn new(store: ConceptStore<R>, enricher: Box<dyn Enricher>, render: RenderConfig) -> Self {
        Self {
            store,
            ctx: SessionContext::new(),
            enricher,
            render,
        }
    }

    #[cfg(test)]
    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    #[cfg(test)]
    pub fn store(&self) -> &ConceptStore<R> {
        &self.store
    }

    pub fn execute(&mut self, command: Command) -> ShellResponse {
        match command {
            Command::List { search } => self.list(search.as_deref()),
            Command::Select { id } => {
                if session::select(&mut self.ctx, &self.store, &id) {
                    self.show()
                } else {
                    ShellResponse::failure(format!("no concept `{id}`"))
                }
            }
            Command::Show => self.show(),
            Command::Layer {
                alias,
                level,
                description,
            } => match self
                .store
                .ensure_layer(&alias, level, description.as_deref())
            {
                Ok(layer) => ShellResponse::success(format!(
                    "layer {} `{}` (level {})",
                    layer.id, layer.alias, layer.level
                )),
                Err(err) => ShellResponse::failure(format!("layer failed: {err}")),
            },
            Command::DropLayer { id } => {
                match session::delete_layer(&mut self.ctx, &mut self.store, &id) {
                    Ok(true) => ShellResponse::success(format!("layer {id} deleted")),
                    Ok(false) => ShellResponse::success(format!("no layer `{id}`; nothing deleted")),
                    Err(err) => ShellResponse::failure(format!("drop-layer failed: {err}")),
                }
            }
            Command::Enrich { term, definition } => self.enrich(&term, &definition),
            Command::Add {
                term,
                definition,
                layer,
                use_enrichment,
            } => self.add(AddTermRequest {
                layer_alias: layer,
                term,
                definition,
                use_enrichment,
                ..AddTermRequest::default()
            }),
            Command::Link { id } => {
                if self.ctx.selected_id.is_none() {
                    return ShellResponse::failure("select a concept first");
                }
                match session::link_selected(&self.ctx, &mut self.store, &id) {
                    Ok(true) => ShellResponse::success(format!("linked with {id}")),
                    Ok(false) => ShellResponse::success("nothing to link"),
                    Err(err) => ShellResponse::failure(format!("link failed: {err}")),
                }
            }
            Command::Delete { id } => {
                let Some(id) = id.or_else(|| self.ctx.selected_id.clone()) else {
                    return ShellResponse::failure("nothing selected to delete");
                };
                if session::request_delete(&mut self.ctx, &self.store, &id) {
                    ShellResponse::success(format!("delete {id}? type `confirm` or `cancel`"))
                } else {
                    ShellResponse::failure(format!("no concept `{id}`"))
                }
            }
            Command::Confirm => match session::confirm_delete(&mut self.ctx, &mut self.store) {
                Ok(true) => ShellResponse::success("deleted"),
                Ok(false) => ShellResponse::success("nothing pending"),
                Err(err) => ShellResponse::failure(format!("delete failed: {err}")),
            },
            Command::Cancel => {
                if session::cancel_delete(&mut self.ctx) {
                    ShellResponse::success("delete cancelled")
                } else {
                    ShellResponse::success("nothing pending")
                }
            }
            Command::Render { format, path } => self.render(format, path),
            Command::Help => ShellResponse::success(HELP),
            Command::Quit => ShellResponse {
                ok: true,
                message: "bye".to_string(),
                quit: true,
            },
        }
    }

    fn list(&mut self, search: Option<&str>) -> ShellResponse {
        let rows = session::sidebar(&mut self.ctx, &self.store, search);
        if rows.is_empty() {
            return ShellResponse::success("no concepts");
        }
        let selected = self.ctx.selected_id.as_deref();
        let mut out = String::new();
        for row in rows {
            let marker = if selected == Some(row.id.as_str()) { '*' } else { ' ' };
            let _ = writeln!(out, "{marker} {:<8} {}", row.id, row.term);
        }
        ShellResponse::success(out.trim_end())
    }

    fn show(&mut self) -> ShellResponse {
        session::sidebar(&mut self.ctx, &self.store, None);
        let Some(selected) = self.ctx.selected_id.clone() else {
            return ShellResponse::success("no concepts");
        };
        let Some((layer, concept)) = self.store.find_concept(&selected) else {
            return ShellResponse::failure(format!("no concept `{selected}`"));
        };

        let mut out = String::new();
        let _ = writeln!(out, "{} {} [layer {} `{}`]", concept.id, concept.term, layer.id, layer.alias);
        if !concept.definition.is_empty() {
            let _ = writeln!(out, "  {}", concept.definition);
        }
        if let Some(kind) = concept.representation_type {
            let _ = writeln!(out, "  type: {kind}");
        }
        for axis in &concept.axes {
            let _ = writeln!(out, "  axis: {} ({:?}) dual={}", axis.axis, axis.role, axis.dual_term);
        }
        if !concept.tags.is_empty() {
            let _ = writeln!(out, "  tags: {}", concept.tags.join(", "));
        }

        let graph = self.store.neighborhood(&selected);
        for edge in &graph.edges {
            let (arrow, other) = match edge.direction {
                RefDirection::Outgoing => ("->", &edge.to),
                RefDirection::Incoming => ("<-", &edge.from),
            };
            let label = graph
                .nodes
                .get(other)
                .map(|node| node.label.as_str())
                .unwrap_or_default();
            let _ = writeln!(out, "  {arrow} {other} {label}");
        }
        if self.ctx.pending_delete_id.as_deref() == Some(selected.as_str()) {
            let _ = writeln!(out, "  (delete pending: confirm or cancel)");
        }
        ShellResponse::success(out.trim_end())
    }

    fn enrich(&mut self, term: &str, definition: &str) -> ShellResponse {
        let pending =
            session::preview_enrichment(&mut self.ctx, self.enricher.as_ref(), term, definition);
        let mut out = String::new();
        if let Some(warning) = pending.warning.as_deref() {
            let _ = writeln!(out, "warning: {warning}");
        }
        if pending.result.is_empty() {
            let _ = writeln!(out, "no suggestions for `{}`", pending.term);
        } else {
            match serde_json::to_string_pretty(&pending.result) {
                Ok(text) => out.push_str(&text),
                Err(err) => return ShellResponse::failure(format!("enrich failed: {err}")),
            }
        }
        ShellResponse::success(out.trim_end())
    }

    fn add(&mut self, request: AddTermRequest) -> ShellResponse {
        match session::add_term(&mut self.ctx, &mut self.store, self.enricher.as_ref(), request) {
            Ok(outcome) => {
                let mut message = format!(
                    "added {} `{}` ({} link(s))",
                    outcome.concept.id,
                    outcome.concept.term,
                    outcome.concept.refs.len()
                );
                if let Some(warning) = outcome.warning {
                    let _ = write!(message, "\nwarning: {warning}");
                }
                ShellResponse::success(message)
            }
            Err(err) => ShellResponse::failure(format!("add failed: {err}")),
        }
    }

    fn render(&mut self, format: ImageFormat, path: Option<PathBuf>) -> ShellResponse {
        session::sidebar(&mut self.ctx, &self.store, None);
        let layout = self.render.layout();
        let renderer: Box<dyn GraphRenderer> = match format {
            ImageFormat::Png => Box::new(PngRenderer::new(layout)),
            ImageFormat::Svg => Box::new(SvgRenderer::new(layout)),
        };
        let image = match session::render_selected(&self.ctx, &self.store, renderer.as_ref()) {
            Ok(Some(image)) => image,
            Ok(None) => return ShellResponse::failure("nothing selected to render"),
            Err(err) => return ShellResponse::failure(format!("render failed: {err}")),
        };

        let path = path.unwrap_or_else(|| {
            let id = self.ctx.selected_id.as_deref().unwrap_or("neighborhood");
            PathBuf::from(format!("neighborhood-{id}.{}", format.extension()))
        });
        match std::fs::write(&path, &image.bytes) {
            Ok(()) => ShellResponse::success(format!(
                "wrote {} ({}, {} bytes)",
                path.display(),
                image.media_type,
                image.bytes.len()
            )),
            Err(err) => {
                warn!("event=render_write module=cli status=error error_code=io");
                ShellResponse::failure(format!("failed to write `{}`: {err}", path.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Shell;
    use crate::commands::parse_line;
    use lingua_core::config::RenderConfig;
    use lingua_core::enrich::NoopEnricher;
    use lingua_core::{ConceptStore, MemoryDocumentRepository};

    fn shell() -> Shell<MemoryDocumentRepository> {
        let store = ConceptStore::open(MemoryDocumentRepository::new()).unwrap();
        Shell::new(store, Box::new(NoopEnricher), RenderConfig::default())
    }

    fn run(shell: &mut Shell<MemoryDocumentRepository>, line: &str) -> super::ShellResponse {
        shell.execute(parse_line(line).unwrap().unwrap())
    }

    #[test]
    fn add_link_and_two_step_delete() {
        let mut shell = shell();
        assert!(run(&mut shell, "add order | regular arrangement | core").ok);
        assert!(run(&mut shell, "add chaos | disorder | core").ok);
        assert_eq!(shell.context().selected_id.as_deref(), Some("1.2"));

        let linked = run(&mut shell, "link 1.1");
        assert!(linked.ok, "{}", linked.message);
        let shown = run(&mut shell, "show");
        assert!(shown.message.contains("-> 1.1 order"));

        assert!(run(&mut shell, "delete").ok);
        assert_eq!(shell.context().pending_delete_id.as_deref(), Some("1.2"));
        assert!(run(&mut shell, "confirm").ok);
        assert!(!shell.store().contains_concept("1.2"));
        assert!(shell.store().find_concept("1.1").unwrap().1.refs.is_empty());

        let listed = run(&mut shell, "list");
        assert!(listed.message.starts_with("* 1.1"));
    }

    #[test]
    fn add_ai_without_credential_warns_but_creates() {
        let mut shell = shell();
        let response = run(&mut shell, "add-ai entropy | measure of disorder");
        assert!(response.ok);
        assert!(response.message.contains("warning: enrichment is disabled"));
        let (layer, _) = shell.store().find_concept("1.1").unwrap();
        assert_eq!(layer.alias, "general");
    }

    #[test]
    fn quit_sets_flag() {
        let mut shell = shell();
        assert!(run(&mut shell, "quit").quit);
    }
}

//! Generic paginated table.
//!
//! Tables only render: each row action is a link or a small POST form aimed at
//! a route the page container supplies. The footer carries the page-size
//! selector and previous/next controls.

use std::fmt::Write;

use crate::pagination::{PAGE_SIZE_CHOICES, Pager};
use crate::views::html::escape;

pub const EMPTY_ROW: &str = "No records found.";

type Cell<'a, T> = Box<dyn Fn(&T) -> String + 'a>;

struct Column<'a, T> {
    header: &'static str,
    cell: Cell<'a, T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Post,
}

struct RowAction<'a, T> {
    label: Cell<'a, T>,
    href: Cell<'a, T>,
    method: Method,
}

pub struct Table<'a, T> {
    columns: Vec<Column<'a, T>>,
    actions: Vec<RowAction<'a, T>>,
    /// Query parameters the pager keeps, such as a list filter.
    carried: Vec<(&'static str, String)>,
}

impl<T> Default for Table<'_, T> {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            actions: Vec::new(),
            carried: Vec::new(),
        }
    }
}

impl<'a, T> Table<'a, T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column whose cell text is escaped.
    #[must_use]
    pub fn column(mut self, header: &'static str, text: impl Fn(&T) -> String + 'a) -> Self {
        self.columns.push(Column {
            header,
            cell: Box::new(move |row: &T| escape(&text(row))),
        });
        self
    }

    /// Add a column whose cell is already HTML.
    #[must_use]
    pub fn html_column(mut self, header: &'static str, html: impl Fn(&T) -> String + 'a) -> Self {
        self.columns.push(Column {
            header,
            cell: Box::new(html),
        });
        self
    }

    /// Keep `name=value` on every pager link. `None` carries nothing.
    #[must_use]
    pub fn carry(mut self, name: &'static str, value: Option<String>) -> Self {
        if let Some(value) = value {
            self.carried.push((name, value));
        }
        self
    }

    /// Row link (edit, view, delete confirmation).
    #[must_use]
    pub fn link(mut self, label: &'static str, href: impl Fn(&T) -> String + 'a) -> Self {
        self.actions.push(RowAction {
            label: Box::new(move |_: &T| label.to_string()),
            href: Box::new(href),
            method: Method::Get,
        });
        self
    }

    /// Row button posting to `href`, with a label that may depend on the row.
    #[must_use]
    pub fn button(
        mut self,
        label: impl Fn(&T) -> String + 'a,
        href: impl Fn(&T) -> String + 'a,
    ) -> Self {
        self.actions.push(RowAction {
            label: Box::new(label),
            href: Box::new(href),
            method: Method::Post,
        });
        self
    }

    /// Render `rows` (already sliced to the current page) with the footer for
    /// `pager`. Footer links point back at `base_path`.
    #[must_use]
    pub fn render(&self, rows: &[T], pager: &Pager, base_path: &str) -> String {
        let mut out = String::from("<table>\n<thead><tr>");
        for column in &self.columns {
            let _ = write!(out, "<th>{}</th>", column.header);
        }
        if !self.actions.is_empty() {
            out.push_str("<th>Actions</th>");
        }
        out.push_str("</tr></thead>\n<tbody>\n");

        if rows.is_empty() {
            let span = self.columns.len() + usize::from(!self.actions.is_empty());
            let _ = writeln!(out, r#"<tr><td colspan="{span}">{EMPTY_ROW}</td></tr>"#);
        }

        for row in rows {
            out.push_str("<tr>");
            for column in &self.columns {
                let _ = write!(out, "<td>{}</td>", (column.cell)(row));
            }
            if !self.actions.is_empty() {
                out.push_str("<td>");
                for action in &self.actions {
                    out.push_str(&render_action(action, row));
                }
                out.push_str("</td>");
            }
            out.push_str("</tr>\n");
        }

        out.push_str("</tbody>\n</table>\n");
        out.push_str(&pager_controls(pager, base_path, &self.carried));
        out
    }
}

fn render_action<T>(action: &RowAction<'_, T>, row: &T) -> String {
    let label = escape(&(action.label)(row));
    let href = escape(&(action.href)(row));
    match action.method {
        Method::Get => format!(r#"<a href="{href}">{label}</a> "#),
        Method::Post => format!(
            r#"<form method="post" action="{href}" style="display:inline"><button type="submit">{label}</button></form> "#
        ),
    }
}

/// Page-size selector plus previous/next links. Unavailable directions are
/// rendered disabled. `carried` parameters ride along on every control.
#[must_use]
pub fn pager_controls(pager: &Pager, base_path: &str, carried: &[(&str, String)]) -> String {
    let size = pager.page_size;
    let mut extra = String::new();
    let mut hidden = String::new();
    for (name, value) in carried {
        let _ = write!(extra, "&amp;{name}={}", escape(&urlencoding::encode(value)));
        let _ = write!(hidden, r#"<input type="hidden" name="{name}" value="{}">"#, escape(value));
    }
    let total_pages = pager.total_pages().max(1);

    let options: String = PAGE_SIZE_CHOICES
        .iter()
        .map(|choice| {
            let selected = if *choice == size { " selected" } else { "" };
            format!(r#"<option value="{choice}"{selected}>{choice}</option>"#)
        })
        .collect();

    let previous = if pager.has_previous() {
        format!(
            r#"<a href="{base_path}?page={}&amp;size={size}{extra}" rel="prev">Previous</a>"#,
            pager.page - 1
        )
    } else {
        r#"<span class="disabled" aria-disabled="true">Previous</span>"#.to_string()
    };
    let next = if pager.has_next() {
        format!(
            r#"<a href="{base_path}?page={}&amp;size={size}{extra}" rel="next">Next</a>"#,
            pager.page + 1
        )
    } else {
        r#"<span class="disabled" aria-disabled="true">Next</span>"#.to_string()
    };

    format!(
        r#"<div class="pager">
<form method="get" action="{base_path}">{hidden}<label>Rows per page <select name="size" onchange="this.form.submit()">{options}</select></label><noscript><button type="submit">Apply</button></noscript></form>
{previous}<span>Page {page} of {total_pages} ({total} total)</span>{next}
</div>"#,
        page = pager.page,
        total = pager.total,
    )
}

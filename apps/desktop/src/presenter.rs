use std::{
    collections::BTreeSet,
    io::{self, Write},
    sync::Mutex,
};

use client_core::Presenter;
use shared::domain::{CategoryFilter, Quote, ALL_CATEGORIES};
use tracing::debug;

pub const NO_QUOTES_MESSAGE: &str = "No quotes available.";

pub fn format_quote(quote: &Quote) -> String {
    format!("\"{}\" - [{}]", quote.text, quote.category)
}

/// Writes quotes and notifications as plain lines.
pub struct TerminalPresenter<W> {
    out: Mutex<W>,
}

impl TerminalPresenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn write_lines<I, S>(&self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        let result = lines
            .into_iter()
            .try_for_each(|line| writeln!(out, "{}", line.as_ref()))
            .and_then(|()| out.flush());
        if let Err(err) = result {
            debug!(error = %err, "presenter: terminal write failed");
        }
    }
}

impl<W: Write + Send> Presenter for TerminalPresenter<W> {
    fn render(&self, quote: Option<&Quote>) {
        match quote {
            Some(quote) => self.write_lines([format_quote(quote)]),
            None => self.write_lines([NO_QUOTES_MESSAGE]),
        }
    }

    fn notify(&self, message: &str) {
        self.write_lines([message]);
    }

    fn render_category_options(&self, categories: &BTreeSet<String>, selected: &CategoryFilter) {
        let options = std::iter::once(ALL_CATEGORIES).chain(categories.iter().map(String::as_str));
        let lines = options.map(|option| {
            let marker = if option == selected.as_str() { '*' } else { ' ' };
            format!("{marker} {option}")
        });
        self.write_lines(std::iter::once("Categories:".to_string()).chain(lines));
    }
}

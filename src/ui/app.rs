//! Application state and event loop.
//!
//! All mutable view state (criteria, the derived filtered view, sort key
//! and direction, selection) lives here and is recomputed through
//! `refresh` after every change; the store's canonical list is never
//! touched.

use std::io::stdout;
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use time::OffsetDateTime;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::config::{CommandExec, Config, UiColors};
use crate::export;
use crate::filter::{self, FilterCriteria, Selection};
use crate::record::ContactRecord;
use crate::sort::{self, SortDirection, SortKey};
use crate::store::{LoadError, RecordStore};
use crate::vcard;

use super::draw;

/// Fixed headline of the error panel shown when the data file cannot be
/// loaded.
pub const LOAD_ERROR_TEXT: &str = "שגיאה בטעינת הנתונים";
pub const NO_RESULTS_TEXT: &str = "אין תוצאות";
/// Display label of the wildcard group/subgroup selection.
pub const ANY_LABEL: &str = "הכל";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneFocus {
    Table,
    Search,
}

/// Help modal state with scroll support
#[derive(Debug, Clone)]
pub struct HelpModal {
    pub scroll: usize,
    pub total_lines: usize,
}

impl HelpModal {
    fn new(total_lines: usize) -> Self {
        Self {
            scroll: 0,
            total_lines,
        }
    }

    fn scroll_down(&mut self, viewport: usize) {
        let max_scroll = self.total_lines.saturating_sub(viewport);
        self.scroll = (self.scroll + 1).min(max_scroll);
    }

    fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }
}

pub struct App {
    pub config: Config,
    store: RecordStore,
    load_error: Option<String>,
    pub criteria: FilterCriteria,
    /// Derived view: indices into the store, filtered and sorted.
    pub filtered: Vec<usize>,
    pub sort_key: SortKey,
    pub sort_dir: SortDirection,
    pub export_enabled: bool,
    /// Position within `filtered`, not a store index.
    pub selected: Option<usize>,
    pub focused: PaneFocus,
    pub search_input: Input,
    pub status: Option<String>,
    group_options: Vec<String>,
    subgroup_options: Vec<String>,
    pub help_modal: Option<HelpModal>,
}

impl App {
    pub fn new(config: Config, load: Result<RecordStore, LoadError>) -> Self {
        let (store, load_error) = match load {
            Ok(store) => (store, None),
            Err(err) => (RecordStore::empty(), Some(err.to_string())),
        };

        let mut app = Self {
            config,
            store,
            load_error,
            criteria: FilterCriteria::default(),
            filtered: Vec::new(),
            sort_key: SortKey::LastName,
            sort_dir: SortDirection::Ascending,
            export_enabled: false,
            selected: None,
            focused: PaneFocus::Table,
            search_input: Input::default(),
            status: None,
            group_options: Vec::new(),
            subgroup_options: Vec::new(),
            help_modal: None,
        };
        app.group_options = app.store.groups();
        app.subgroup_options = app.store.subgroups(None);
        app.refresh();
        app
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop<B>(&mut self, terminal: &mut Terminal<B>) -> Result<()>
    where
        B: ratatui::backend::Backend,
    {
        loop {
            draw::render(terminal, self)?;

            if event::poll(Duration::from_millis(250))? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key)? {
                            break;
                        }
                    }
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        // Ctrl+C always quits
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Ok(true);
        }

        if self.help_modal.is_some() {
            self.handle_help_modal_key(key);
            return Ok(false);
        }

        match self.focused {
            PaneFocus::Search => self.handle_search_key(key),
            PaneFocus::Table => self.handle_table_key(key),
        }
    }

    fn handle_help_modal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => self.help_modal = None,
            KeyCode::Char('j') | KeyCode::Down => {
                if let Some(modal) = self.help_modal.as_mut() {
                    modal.scroll_down(draw::HELP_VIEWPORT);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if let Some(modal) = self.help_modal.as_mut() {
                    modal.scroll_up();
                }
            }
            _ => {}
        }
    }

    /// Live filtering: every accepted edit of the search box re-derives the
    /// view immediately.
    fn handle_search_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.focused = PaneFocus::Table;
            }
            _ => {
                if self.search_input.handle_event(&Event::Key(key)).is_some() {
                    self.criteria.query = self.search_input.value().to_string();
                    self.refresh();
                }
            }
        }
        Ok(false)
    }

    fn handle_table_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('/') => {
                self.focused = PaneFocus::Search;
            }
            KeyCode::Char('?') => {
                self.help_modal = Some(HelpModal::new(draw::help_lines().len()));
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('g') => self.cycle_group(1),
            KeyCode::Char('G') => self.cycle_group(-1),
            KeyCode::Char('s') => self.cycle_subgroup(1),
            KeyCode::Char('S') => self.cycle_subgroup(-1),
            KeyCode::Char(digit @ '1'..='6') => {
                if let Some(sort_key) = SortKey::from_digit(digit) {
                    self.select_sort(sort_key);
                }
            }
            KeyCode::Enter | KeyCode::Char('c') => self.call_selected(),
            KeyCode::Char('w') => self.message_selected(),
            KeyCode::Char('v') => self.export_selected(),
            KeyCode::Char('e') => self.export_batch(),
            _ => {}
        }
        Ok(false)
    }

    /// Re-derive the filtered view, its order, the export flag, and a valid
    /// selection. The canonical list is read-only here.
    pub fn refresh(&mut self) {
        self.filtered = filter::filter(
            self.store.records(),
            &self.criteria,
            self.config.search_includes_phone_links,
        );
        sort::sort(
            self.store.records(),
            &mut self.filtered,
            self.sort_key,
            self.sort_dir,
        );
        self.export_enabled = filter::export_enabled(&self.criteria, self.filtered.len());
        self.selected = if self.filtered.is_empty() {
            None
        } else {
            Some(self.selected.unwrap_or(0).min(self.filtered.len() - 1))
        };
    }

    /// Re-selecting the active column toggles direction; a new column
    /// starts ascending.
    pub fn select_sort(&mut self, key: SortKey) {
        if self.sort_key == key {
            self.sort_dir = self.sort_dir.toggled();
        } else {
            self.sort_key = key;
            self.sort_dir = SortDirection::Ascending;
        }
        self.refresh();
    }

    fn move_selection(&mut self, delta: isize) {
        if self.filtered.is_empty() {
            return;
        }
        let last = self.filtered.len() as isize - 1;
        let current = self.selected.unwrap_or(0) as isize;
        self.selected = Some((current + delta).clamp(0, last) as usize);
    }

    /// Changing the group resets the subgroup to the wildcard and rescopes
    /// its option list to the subgroups present in the new group.
    fn cycle_group(&mut self, step: isize) {
        let next = cycle_selection(&self.criteria.group, &self.group_options, step);
        if next == self.criteria.group {
            return;
        }
        self.criteria.group = next;
        self.criteria.subgroup = Selection::Any;
        self.subgroup_options = self.store.subgroups(self.criteria.group.as_concrete());
        self.refresh();
    }

    fn cycle_subgroup(&mut self, step: isize) {
        let next = cycle_selection(&self.criteria.subgroup, &self.subgroup_options, step);
        if next == self.criteria.subgroup {
            return;
        }
        self.criteria.subgroup = next;
        self.refresh();
    }

    fn selected_record(&self) -> Option<&ContactRecord> {
        self.selected
            .and_then(|position| self.filtered.get(position))
            .map(|&index| &self.store.records()[index])
    }

    fn call_selected(&mut self) {
        let Some(record) = self.selected_record() else {
            return;
        };
        if record.mobile_phone_link.is_empty() {
            self.set_status("אין מספר חיוג לרשומה זו");
            return;
        }
        let uri = format!("tel:{}", record.mobile_phone_link);
        let label = format!("חיוג: {}", record.mobile_display);
        self.launch(self.config.commands.dial.clone(), uri, label);
    }

    fn message_selected(&mut self) {
        let Some(record) = self.selected_record() else {
            return;
        };
        if record.mobile_messaging_link.is_empty() {
            self.set_status("אין מספר וואטסאפ לרשומה זו");
            return;
        }
        let uri = format!("https://wa.me/{}", record.mobile_messaging_link);
        let label = format!("וואטסאפ: {} {}", record.first_name, record.last_name);
        self.launch(self.config.commands.message.clone(), uri, label);
    }

    fn launch(&mut self, command: Option<CommandExec>, uri: String, label: String) {
        let Some(command) = command else {
            self.set_status("לא הוגדרה פקודת פתיחה");
            return;
        };
        match run_link_command(&command, &uri) {
            Ok(()) => self.set_status(label),
            Err(err) => self.set_status(format!("{err:#}")),
        }
    }

    fn export_selected(&mut self) {
        let Some(record) = self.selected_record().cloned() else {
            return;
        };
        let content = vcard::to_vcard(&record);
        let filename = format!("{}.vcf", export::single_stem(&record));
        match export::save_vcard(&self.config.export_dir, &filename, &content) {
            Ok(path) => self.set_status(format!("נשמר: {}", path.display())),
            Err(err) => self.set_status(format!("שמירה נכשלה: {err:#}")),
        }
    }

    fn export_batch(&mut self) {
        if !self.export_enabled {
            self.set_status("ייצוא קבוצתי מחייב בחירת פלוגה ומסגרת עם תוצאות");
            return;
        }
        let (filename, content, count) = {
            let group = self.criteria.group.as_concrete().unwrap_or_default();
            let subgroup = self.criteria.subgroup.as_concrete().unwrap_or_default();
            let records: Vec<&ContactRecord> = self
                .filtered
                .iter()
                .map(|&index| &self.store.records()[index])
                .collect();
            let stem = export::batch_stem(group, subgroup, OffsetDateTime::now_utc().date());
            (
                format!("{stem}.vcf"),
                vcard::to_vcard_batch(records.iter().copied()),
                records.len(),
            )
        };
        match export::save_vcard(&self.config.export_dir, &filename, &content) {
            Ok(path) => self.set_status(format!("נשמרו {} אנשי קשר: {}", count, path.display())),
            Err(err) => self.set_status(format!("שמירה נכשלה: {err:#}")),
        }
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        self.status = Some(message.into());
    }

    // ---- accessors used by the renderer ----

    pub fn ui_colors(&self) -> &UiColors {
        &self.config.ui.colors
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn total(&self) -> usize {
        self.store.len()
    }

    pub fn visible_records(&self) -> Vec<&ContactRecord> {
        self.filtered
            .iter()
            .map(|&index| &self.store.records()[index])
            .collect()
    }

    pub fn group_label(&self) -> &str {
        self.criteria.group.as_concrete().unwrap_or(ANY_LABEL)
    }

    pub fn subgroup_label(&self) -> &str {
        self.criteria.subgroup.as_concrete().unwrap_or(ANY_LABEL)
    }
}

/// Step through wildcard + options, wrapping at both ends. Position 0 is
/// the wildcard.
fn cycle_selection(current: &Selection, options: &[String], step: isize) -> Selection {
    if options.is_empty() {
        return Selection::Any;
    }
    let slots = options.len() as isize + 1;
    let position = match current {
        Selection::Any => 0,
        Selection::Only(value) => options
            .iter()
            .position(|option| option == value)
            .map(|index| index as isize + 1)
            .unwrap_or(0),
    };
    let next = (position + step).rem_euclid(slots);
    if next == 0 {
        Selection::Any
    } else {
        Selection::Only(options[(next - 1) as usize].clone())
    }
}

fn run_link_command(command: &CommandExec, uri: &str) -> Result<()> {
    Command::new(&command.program)
        .args(&command.args)
        .arg(uri)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn `{}`", command.program))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RawRecord;

    fn sample_store() -> RecordStore {
        let raw: Vec<RawRecord> = serde_json::from_str(
            r#"[
                {"firstName":"דנה","lastName":"כהן","pluga":"א","framework":"חוד","mobileE164":"+97250"},
                {"firstName":"אבי","lastName":"לוי","pluga":"א","framework":"עורף"},
                {"firstName":"גל","lastName":"מזרחי","pluga":"ב","framework":"חוד"}
            ]"#,
        )
        .unwrap();
        RecordStore::from_raw(raw)
    }

    fn app() -> App {
        App::new(Config::default(), Ok(sample_store()))
    }

    #[test]
    fn test_new_app_shows_everything() {
        let app = app();
        assert_eq!(app.filtered.len(), 3);
        assert_eq!(app.selected, Some(0));
        assert!(app.load_error().is_none());
        assert!(!app.export_enabled);
    }

    #[test]
    fn test_load_failure_keeps_app_usable() {
        let dir = tempfile::tempdir().unwrap();
        let err = RecordStore::load(&dir.path().join("missing.json")).unwrap_err();
        let app = App::new(Config::default(), Err(err));
        assert!(app.load_error().unwrap().contains("missing.json"));
        assert!(app.filtered.is_empty());
        assert_eq!(app.selected, None);
    }

    #[test]
    fn test_group_cycle_rescopes_subgroups_and_resets() {
        let mut app = app();
        app.cycle_subgroup(1);
        assert!(app.criteria.subgroup.is_concrete());

        app.cycle_group(1); // -> "א"
        assert_eq!(app.criteria.group, Selection::only("א"));
        assert_eq!(app.criteria.subgroup, Selection::Any);
        assert_eq!(
            app.subgroup_options,
            vec!["חוד".to_string(), "עורף".to_string()]
        );
    }

    #[test]
    fn test_group_cycle_wraps_back_to_wildcard() {
        let mut app = app();
        app.cycle_group(1);
        app.cycle_group(1);
        app.cycle_group(1);
        assert_eq!(app.criteria.group, Selection::Any);
        assert_eq!(app.subgroup_options.len(), 2); // all subgroups again
    }

    #[test]
    fn test_second_sort_on_same_key_toggles() {
        let mut app = app();
        app.select_sort(SortKey::FirstName);
        assert_eq!(app.sort_dir, SortDirection::Ascending);
        let ascending = app.filtered.clone();
        app.select_sort(SortKey::FirstName);
        assert_eq!(app.sort_dir, SortDirection::Descending);
        let descending = app.filtered.clone();
        let mut reversed = ascending;
        reversed.reverse();
        assert_eq!(descending, reversed);
    }

    #[test]
    fn test_export_enablement_follows_selection() {
        let mut app = app();
        app.cycle_group(1); // "א"
        assert!(!app.export_enabled);
        app.cycle_subgroup(1); // "חוד"
        assert!(app.export_enabled);
        // narrow to nothing: a query no record matches
        app.criteria.query = "אין כזה".to_string();
        app.refresh();
        assert!(!app.export_enabled);
    }

    #[test]
    fn test_selection_clamped_after_narrowing() {
        let mut app = app();
        app.selected = Some(2);
        app.criteria.query = "דנה".to_string();
        app.refresh();
        assert_eq!(app.filtered.len(), 1);
        assert_eq!(app.selected, Some(0));
    }

    #[test]
    fn test_cycle_selection_backwards_from_wildcard() {
        let options = vec!["א".to_string(), "ב".to_string()];
        let last = cycle_selection(&Selection::Any, &options, -1);
        assert_eq!(last, Selection::Only("ב".to_string()));
    }
}

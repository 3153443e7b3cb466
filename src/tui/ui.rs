use crate::tui::app::{App, AppState, FileFilter};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

pub fn draw(f: &mut Frame, app: &mut App) {
    match app.state {
        AppState::Home => draw_home(f, app),
        AppState::NewSession => draw_new_session(f, app),
        AppState::Processing => draw_processing(f, app),
        AppState::Results => draw_results(f, app),
        AppState::Browser => draw_browser(f, app),
        AppState::Viewer => draw_viewer(f, app),
        AppState::Settings => draw_settings(f, app),
    }
}

fn title_block(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
}

fn help_block(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
}

fn draw_home(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(1),    // Menu
            Constraint::Length(3), // Help
        ])
        .split(f.area());

    f.render_widget(title_block("Lifestyle Coach"), chunks[0]);

    let options = [
        "● New Coaching Session",
        "○ View Reports",
        "○ View Plans & Calendars",
        "○ Settings",
    ];

    let menu_items: Vec<ListItem> = options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let style = if i == app.selected_option {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let text = if i == app.selected_option {
                option.replace("○", "●")
            } else {
                option.replace("●", "○")
            };

            ListItem::new(Line::from(Span::styled(text, style)))
        })
        .collect();

    let menu = List::new(menu_items)
        .block(Block::default().borders(Borders::ALL).title("Menu"))
        .style(Style::default().fg(Color::White));
    f.render_widget(menu, chunks[1]);

    f.render_widget(
        help_block("[↑↓] Navigate  [Enter] Select  [q] Exit"),
        chunks[2],
    );
}

fn draw_new_session(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // URL input
            Constraint::Min(4),    // Added URLs
            Constraint::Length(4), // Options
            Constraint::Length(3), // Help
        ])
        .split(f.area());

    f.render_widget(title_block("New Coaching Session"), chunks[0]);

    app.url_input.render(f, chunks[1]);

    let url_items: Vec<ListItem> = app
        .urls
        .iter()
        .enumerate()
        .map(|(i, url)| ListItem::new(Line::from(format!("{}. {url}", i + 1))))
        .collect();
    let url_count = app.urls.len();
    let url_list = List::new(url_items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Videos in this session ({url_count})")),
    );
    f.render_widget(url_list, chunks[2]);

    let options_block = Block::default().borders(Borders::ALL).title("Options");
    f.render_widget(options_block, chunks[3]);

    let option_area = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(chunks[3]);

    let structured_style = if app.input_focus == 1 {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };
    let calendar_style = if app.input_focus == 2 {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };

    let structured_mark = if app.structured_mode { "☑" } else { "☐" };
    let calendar_mark = if app.export_calendar { "☑" } else { "☐" };

    f.render_widget(
        Paragraph::new(format!("{structured_mark} Structured daily plan (strict JSON)"))
            .style(structured_style),
        option_area[0],
    );
    f.render_widget(
        Paragraph::new(format!("{calendar_mark} Offer calendar export (implies plan)"))
            .style(calendar_style),
        option_area[1],
    );

    let help = match &app.notice {
        Some(notice) => help_block_owned(notice.clone()),
        None => help_block_owned(
            "[Enter] Add URL / Start  [Tab] Focus  [Space] Toggle  [Esc] Back".to_string(),
        ),
    };
    f.render_widget(help, chunks[4]);
}

fn draw_processing(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(1),    // Progress area
            Constraint::Length(3), // Help
        ])
        .split(f.area());

    f.render_widget(title_block("Processing..."), chunks[0]);

    app.progress_bar.render(f, chunks[1]);

    f.render_widget(help_block("[Esc] Back"), chunks[2]);
}

fn draw_results(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(f.area());

    if let Some(viewer) = &mut app.content_viewer {
        app.viewer_height = chunks[0].height;
        viewer.render(f, chunks[0]);
    }

    let help = match &app.notice {
        Some(notice) => help_block_owned(notice.clone()),
        None => help_block_owned(
            "[s] Save  [c] Export calendar  [↑↓] Scroll  [Esc] Home".to_string(),
        ),
    };
    f.render_widget(help, chunks[1]);
}

fn draw_browser(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(22), Constraint::Min(1)])
        .split(f.area());

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Filters
            Constraint::Length(3), // Search
        ])
        .split(chunks[0]);

    let filter_options = ["All", "Reports", "Plans", "Calendars"];
    let filter_items: Vec<ListItem> = filter_options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let is_selected = matches!(
                (app.filter, i),
                (FileFilter::All, 0)
                    | (FileFilter::Reports, 1)
                    | (FileFilter::Plans, 2)
                    | (FileFilter::Calendars, 3)
            );

            let style = if is_selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let marker = if is_selected { "●" } else { "○" };
            ListItem::new(Line::from(Span::styled(format!("{marker} {option}"), style)))
        })
        .collect();

    let filters =
        List::new(filter_items).block(Block::default().borders(Borders::ALL).title("Filters"));
    f.render_widget(filters, left_chunks[0]);

    app.search_input.render(f, left_chunks[1]);

    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(chunks[1]);

    app.file_list.render(f, right_chunks[0], "Saved artifacts");

    f.render_widget(
        help_block("[Enter] Open  [Del] Delete  [Space] Select  [/] Search  [1-4] Filters  [Esc] Back"),
        right_chunks[1],
    );
}

fn draw_viewer(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(f.area());

    if let Some(viewer) = &mut app.content_viewer {
        app.viewer_height = chunks[0].height;
        viewer.render(f, chunks[0]);
    }

    f.render_widget(
        help_block("[↑↓] Scroll  [PgUp/PgDn] Page  [Home/End] Jump  [Esc] Back"),
        chunks[1],
    );
}

fn draw_settings(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // API key
            Constraint::Length(3), // Model
            Constraint::Length(3), // API base
            Constraint::Min(1),    // Note
            Constraint::Length(3), // Help
        ])
        .split(f.area());

    f.render_widget(title_block("Settings"), chunks[0]);

    app.api_key_input.render(f, chunks[1]);
    app.model_input.render(f, chunks[2]);
    app.api_base_input.render(f, chunks[3]);

    let note = Paragraph::new(
        "The credential is held in memory for this session only; it is never saved or logged.",
    )
    .style(Style::default().fg(Color::DarkGray))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(note, chunks[4]);

    f.render_widget(help_block("[Tab] Next field  [Esc] Back"), chunks[5]);
}

fn help_block_owned(text: String) -> Paragraph<'static> {
    Paragraph::new(text)
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
}

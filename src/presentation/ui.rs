use crate::application::{App, AppMode, FORM_LABELS, FormKind, GRADE_LABELS};
use crate::domain::format_scores;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
};

pub fn render_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_students(f, app, chunks[1]);
    render_status_bar(f, app, chunks[2]);

    match app.mode {
        AppMode::Form(kind) => render_form_popup(f, app, kind),
        AppMode::ConfirmDelete => render_confirm_popup(f, app),
        AppMode::Details => render_details_popup(f, app),
        AppMode::Attendance => render_attendance_popup(f, app),
        AppMode::Help => render_help_popup(f, app.help_scroll),
        AppMode::Normal | AppMode::Search => {}
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let sync = if app.service.is_synced() { "" } else { " | UNSAVED CHANGES" };
    let header = Paragraph::new(format!(
        "roster - Student Tracking | {} students | sort: {} | {}{}",
        app.service.len(),
        app.sort.label(),
        app.service.data_location(),
        sync
    ))
    .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn render_students(f: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(["Name", "Surname", "Class", "Absence", "Average"].map(|h| {
        Cell::from(h).style(Style::default().fg(Color::Yellow))
    }))
    .height(1);

    let rows: Vec<Row> = app
        .visible_students()
        .into_iter()
        .map(|s| {
            Row::new(vec![
                Cell::from(s.name.clone()),
                Cell::from(s.surname.clone()),
                Cell::from(s.class_name.clone()),
                Cell::from(s.absence_count.to_string()),
                Cell::from(format!("{:.2}", s.average(None))),
            ])
            .height(1)
        })
        .collect();

    let title = if app.search_query.is_empty() {
        "Students".to_string()
    } else {
        format!("Students (search: {})", app.search_query)
    };

    let widths = [
        Constraint::Percentage(25),
        Constraint::Percentage(25),
        Constraint::Percentage(15),
        Constraint::Percentage(15),
        Constraint::Percentage(20),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
        .column_spacing(1);

    let mut state = TableState::default();
    if app.selected_student().is_some() {
        state.select(Some(app.selected));
    }
    f.render_stateful_widget(table, area, &mut state);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let input_text = match app.mode {
        AppMode::Normal => match &app.status_message {
            Some(status) => status.clone(),
            None => "a: add | e: edit | d: delete | Enter: details | t: attendance | b: backup | x: export CSV | s: sort | /: search | ?: help | q: quit".to_string(),
        },
        AppMode::Search => format!("Search: {} (Enter to keep, Esc to clear)", app.search_query),
        AppMode::Help => "↑↓/jk: scroll | PgUp/PgDn: fast scroll | Home: top | Esc/q: close help".to_string(),
        _ => app
            .status_message
            .clone()
            .unwrap_or_else(|| "Tab: next field | Enter: save | Esc: cancel".to_string()),
    };

    let input = Paragraph::new(input_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(match app.mode {
            AppMode::Normal => Style::default(),
            AppMode::Search => Style::default().fg(Color::Green),
            AppMode::Help => Style::default().fg(Color::Cyan),
            AppMode::ConfirmDelete => Style::default().fg(Color::Red),
            _ => Style::default().fg(Color::Yellow),
        });
    f.render_widget(input, area);
}

fn popup_area(area: Rect, width_pct: u16, height: u16) -> Rect {
    let width = area.width * width_pct / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// One `label: value` line per input, marking the focused one with a cursor.
fn input_lines(app: &App, labels: &[&str]) -> Vec<Line<'static>> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let value = app.inputs.get(i).cloned().unwrap_or_default();
            if i == app.focus {
                let at = value
                    .char_indices()
                    .nth(app.cursor_position)
                    .map_or(value.len(), |(b, _)| b);
                let (before, after) = value.split_at(at);
                Line::styled(
                    format!("> {label}: {before}|{after}"),
                    Style::default().add_modifier(Modifier::BOLD),
                )
            } else {
                Line::from(format!("  {label}: {value}"))
            }
        })
        .collect()
}

fn render_form_popup(f: &mut Frame, app: &App, kind: FormKind) {
    let area = popup_area(f.area(), 50, 7);
    f.render_widget(Clear, area);
    let title = match kind {
        FormKind::Add => "Add Student",
        FormKind::Edit => "Edit Student",
    };
    let form = Paragraph::new(input_lines(app, &FORM_LABELS))
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(Color::White));
    f.render_widget(form, area);
}

fn render_confirm_popup(f: &mut Frame, app: &App) {
    let area = popup_area(f.area(), 50, 4);
    f.render_widget(Clear, area);
    let name = app
        .target_student()
        .map(|s| s.full_name())
        .unwrap_or_default();
    let prompt = Paragraph::new(format!("Delete {name}? (y/n)"))
        .block(Block::default().borders(Borders::ALL).title("Confirm"))
        .style(Style::default().fg(Color::Red));
    f.render_widget(prompt, area);
}

fn render_details_popup(f: &mut Frame, app: &App) {
    let area = popup_area(f.area(), 60, 20);
    f.render_widget(Clear, area);

    let Some(student) = app.target_student() else {
        return;
    };

    let mut lines = vec![
        Line::from(format!("Class: {}", student.class_name)),
        Line::from(format!("Absence: {}", student.absence_count)),
        Line::from(format!("Average: {:.2}", student.average(None))),
        Line::from(""),
        Line::styled("Grades", Style::default().fg(Color::Yellow)),
    ];
    if student.grades.is_empty() {
        lines.push(Line::from("  (none)"));
    }
    for (lesson, scores) in &student.grades {
        lines.push(Line::from(format!(
            "  {lesson}: {} (avg {:.2})",
            format_scores(scores),
            student.average(Some(lesson.as_str()))
        )));
    }
    lines.push(Line::from(""));
    lines.extend(input_lines(app, &GRADE_LABELS));

    let details = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Details: {}", student.full_name())),
        )
        .style(Style::default().fg(Color::White));
    f.render_widget(details, area);
}

fn render_attendance_popup(f: &mut Frame, app: &App) {
    let area = popup_area(f.area(), 50, 5);
    f.render_widget(Clear, area);
    let current = app.target_student().map_or(0, |s| s.absence_count);
    let mut lines = vec![Line::from(format!("Current absence: {current}"))];
    lines.extend(input_lines(app, &["Change (e.g. 1 or -1)"]));
    let prompt = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Attendance"))
        .style(Style::default().fg(Color::White));
    f.render_widget(prompt, area);
}

fn render_help_popup(f: &mut Frame, scroll: usize) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);

    let help_lines: Vec<&str> = HELP_TEXT.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;

    let start_line = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(help_lines.len());

    let visible_text = help_lines[start_line..end_line].join("\n");

    let help_widget = Paragraph::new(visible_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("roster Help (Line {}/{})", start_line + 1, help_lines.len()))
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(help_widget, popup_area);
}

pub const HELP_TEXT: &str = r#"ROSTER - STUDENT TRACKING

=== STUDENTS ===
a               Add a student (name, surname and class are required)
e               Edit the selected student (blank fields keep their value)
d               Delete the selected student (asks y/n)
Enter           Details: grades per lesson, add a grade
t               Change absences (e.g. 1 or -1, never below zero)

=== GRADES ===
Grades are whole numbers from 0 to 100.
Averages are shown per lesson and across all lessons.

=== LIST ===
↑↓ or j/k       Move selection
s               Cycle sort: default, average (high first), absence (high first)
/               Search by name or surname (Esc clears)
r               Refresh

=== FILES ===
b               Back up the data file (<file>.YYYYMMDD_HHMMSS.bak)
x               Export students_export.csv next to the data file
                Every change is saved to the data file immediately.
                If a save fails the header shows UNSAVED CHANGES;
                press w to write the file again.

=== FORMS ===
Tab/Shift+Tab   Next/previous field
←→ Home End     Move the cursor
Enter           Save
Esc             Cancel

=== HELP NAVIGATION ===
↑↓ or j/k       Scroll help text up/down one line
Page Up/Down    Scroll help text up/down 5 lines
Home            Jump to top of help text
Esc/F1/?/q      Close this help window

q               Quit"#;

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::models::MIN_PASSWORD_LEN;
use crate::ui::app::{App, LoginField};
use crate::ui::theme;
use crate::ui::util::{mask, truncate};

const FORM_WIDTH: u16 = 54;
const LABEL_WIDTH: usize = 10;

fn label(field: LoginField) -> &'static str {
    match field {
        LoginField::Username => "Username",
        LoginField::Email => "Email",
        LoginField::Password => "Password",
    }
}

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let form = &app.login;
    let title = if form.registering {
        " Create account "
    } else {
        " Log in "
    };

    let value_width = (FORM_WIDTH as usize).saturating_sub(LABEL_WIDTH + 6);
    let mut lines = vec![Line::from("")];
    let mut cursor = None;

    for (row, &field) in form.fields().iter().enumerate() {
        let raw = match field {
            LoginField::Username => form.username.clone(),
            LoginField::Email => form.email.clone(),
            LoginField::Password => mask(&form.password),
        };
        let shown = truncate(&raw, value_width);
        let focused = field == form.focused();

        let value_style = if focused {
            Style::default()
                .fg(theme::TEXT)
                .bg(theme::SURFACE)
                .add_modifier(Modifier::BOLD)
        } else {
            theme::normal_style()
        };
        let marker = if focused { "›" } else { " " };

        if focused {
            // border + blank line + two lines per field
            cursor = Some((
                (LABEL_WIDTH + 3 + shown.chars().count()) as u16,
                2 + row as u16 * 2,
            ));
        }

        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(theme::ACCENT)),
            Span::styled(
                format!(" {:<width$}", label(field), width = LABEL_WIDTH),
                theme::dim_style(),
            ),
            Span::styled(
                format!("{shown:<value_width$}"),
                value_style,
            ),
        ]));
        lines.push(Line::from(""));
    }

    let switch_hint = if form.registering {
        "Ctrl-r: back to log in"
    } else {
        "Ctrl-r: create an account"
    };
    lines.push(Line::from(Span::styled(
        "Enter: submit   Tab: next field",
        theme::dim_style(),
    )));
    lines.push(Line::from(Span::styled(switch_hint, theme::dim_style())));
    if form.registering {
        lines.push(Line::from(Span::styled(
            format!("Passwords need at least {MIN_PASSWORD_LEN} characters"),
            theme::dim_style(),
        )));
    }
    if app.busy {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Contacting server…",
            Style::default().fg(theme::YELLOW),
        )));
    }

    let height = (lines.len() as u16 + 2).min(area.height);
    let width = FORM_WIDTH.min(area.width);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let popup = Rect::new(x, y, width, height);

    f.render_widget(Clear, popup);
    let block = Block::default()
        .title(Span::styled(
            title,
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::ACCENT));
    f.render_widget(Paragraph::new(lines).block(block), popup);

    if let Some((dx, dy)) = cursor {
        if dy < height.saturating_sub(1) && dx < width.saturating_sub(1) {
            f.set_cursor_position((popup.x + dx, popup.y + dy));
        }
    }
}

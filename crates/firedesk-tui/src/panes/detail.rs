//! Detail popup for one object: card, external test data, zones,
//! contacts and the latest events.

use std::sync::Arc;

use chrono::NaiveDateTime;
use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};

use firedesk_core::{ObjectDetails, ObjectId, ThemeSettings, ZoneStatus, row_colors};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

use super::{Nav, centered, nav_key};

const RECENT_EVENTS: usize = 15;
const TEST_MESSAGES: usize = 5;

pub struct DetailView {
    settings: Arc<ThemeSettings>,
    details: Arc<ObjectDetails>,
    scroll: u16,
}

impl DetailView {
    pub fn new(details: Arc<ObjectDetails>, settings: Arc<ThemeSettings>) -> Self {
        Self {
            settings,
            details,
            scroll: 0,
        }
    }

    pub fn object_id(&self) -> ObjectId {
        self.details.object.id
    }

    fn lines(&self) -> Vec<Line<'_>> {
        let d = &self.details;
        let o = &d.object;
        let mut lines = Vec::new();

        let status = theme::pair_style(row_colors(o.flags, &self.settings, self.settings.active()));
        lines.push(Line::from(vec![
            Span::styled(format!(" №{} ", o.id), status.add_modifier(Modifier::BOLD)),
            Span::raw(" "),
            Span::styled(o.name.as_str(), theme::title_style()),
            Span::raw("  "),
            Span::styled(format!(" {} ", o.status_label()), status),
        ]));
        lines.push(Line::from(Span::styled(format!(" {}", o.address), theme::value())));
        lines.push(Line::default());

        field(&mut lines, "Договір", &o.contract);
        field(&mut lines, "Телефон", o.phone());
        field(&mut lines, "SIM1", &o.sim1);
        field(&mut lines, "SIM2", &o.sim2);
        if let Some(detail) = &o.detail {
            field(&mut lines, "Прилад", &detail.device_type);
            field(&mut lines, "Марка ППК", &detail.panel_mark);
            field(&mut lines, "Канал", &detail.channel.to_string());
            field(&mut lines, "Живлення", detail.power.label());
            field(&mut lines, "Акумулятор", &detail.battery_state.to_string());
            field(&mut lines, "Автотест, год", &detail.auto_test_hours.to_string());
            field(&mut lines, "Розташування", &detail.location);
            field(&mut lines, "Примітки", &detail.notes);
        }

        section(&mut lines, "Зв'язок");
        field(&mut lines, "Сигнал", &d.external.signal);
        field(&mut lines, "Останній тест", &timestamp(d.external.last_test));
        field(&mut lines, "Останнє повідомл.", &timestamp(d.external.last_message));
        for msg in d.external.test_messages.iter().take(TEST_MESSAGES) {
            lines.push(Line::from(vec![
                Span::styled(format!("   {}  ", timestamp(msg.time)), theme::label()),
                Span::styled(format!("{} {}", msg.info, msg.details), theme::value()),
            ]));
        }

        section(&mut lines, &format!("Зони ({})", d.zones.len()));
        for zone in &d.zones {
            let style = if zone.status == ZoneStatus::Normal {
                theme::value()
            } else {
                Style::default().fg(theme::SIGNAL_RED).add_modifier(Modifier::BOLD)
            };
            lines.push(Line::from(vec![
                Span::styled(format!("   {:>3}  ", zone.number), theme::label()),
                Span::styled(format!("{:<24} {:<14} ", zone.name, zone.sensor_type), theme::value()),
                Span::styled(zone.status.label(), style),
            ]));
        }

        section(&mut lines, &format!("Контакти ({})", d.contacts.len()));
        for contact in &d.contacts {
            lines.push(Line::from(vec![
                Span::styled(format!("   {}. ", contact.priority), theme::label()),
                Span::styled(format!("{}  ", contact.name), theme::value()),
                Span::styled(format!("{}  ", contact.position), theme::label()),
                Span::styled(contact.phone.as_str(), Style::default().fg(theme::STEEL_CYAN)),
            ]));
        }

        section(&mut lines, "Останні події");
        for event in d.events.iter().take(RECENT_EVENTS) {
            let colors = theme::pair_style(self.settings.classify_active(event.code));
            lines.push(Line::from(vec![
                Span::styled(format!("   {}  ", event.date_time_display()), theme::label()),
                Span::styled(format!(" {} ", event.kind.label()), colors),
                Span::styled(format!("  {}", event.details), theme::value()),
            ]));
        }

        lines
    }
}

fn section(lines: &mut Vec<Line<'_>>, title: &str) {
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(format!(" {title}"), theme::title_style())));
}

fn field(lines: &mut Vec<Line<'_>>, label: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    lines.push(Line::from(vec![
        Span::styled(format!("   {label:<18}"), theme::label()),
        Span::styled(value.to_owned(), theme::value()),
    ]));
}

fn timestamp(time: Option<NaiveDateTime>) -> String {
    time.map_or_else(|| "—".into(), |t| t.format("%d.%m.%Y %H:%M:%S").to_string())
}

impl Component for DetailView {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match nav_key(key) {
            Some(Nav::By(delta)) => {
                let delta = i16::try_from(delta).unwrap_or(0);
                self.scroll = self.scroll.saturating_add_signed(delta);
            }
            Some(Nav::First) => self.scroll = 0,
            Some(Nav::Last) => self.scroll = u16::try_from(self.lines().len()).unwrap_or(u16::MAX),
            None => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        // Slow-poll reloads of the same object keep the scroll position.
        if let Action::DetailsLoaded(details) = action {
            if details.object.id == self.object_id() {
                self.details = Arc::clone(details);
            }
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let width = area.width.saturating_mul(4) / 5;
        let height = area.height.saturating_mul(4) / 5;
        let popup = centered(area, width.max(40), height.max(10));

        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(format!(" Об'єкт №{} ", self.object_id()))
            .title_bottom(Line::from(vec![
                Span::styled(" j/k ", theme::key_hint_key()),
                Span::styled("прокрутка  ", theme::key_hint()),
                Span::styled("Esc ", theme::key_hint_key()),
                Span::styled("закрити ", theme::key_hint()),
            ]))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));

        let paragraph = Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0));
        frame.render_widget(paragraph, popup);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crossterm::event::KeyCode;
    use firedesk_core::store::DemoStore;
    use firedesk_core::load_details;

    use super::*;

    async fn view(id: i64) -> DetailView {
        let store = DemoStore::frozen();
        let details = load_details(&store, ObjectId(id)).await.unwrap().unwrap();
        DetailView::new(Arc::new(details), Arc::new(ThemeSettings::default()))
    }

    fn text(view: &DetailView) -> String {
        view.lines()
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn card_lists_zones_and_events() {
        let view = view(1003).await;
        let text = text(&view);
        assert!(text.contains("Школа №25"), "{text}");
        assert!(text.contains("Спортзал"), "{text}");
        assert!(text.contains("Останні події"), "{text}");
    }

    #[tokio::test]
    async fn scrolling_never_goes_negative() {
        let mut view = view(1001).await;
        view.handle_key_event(KeyEvent::from(KeyCode::Up)).unwrap();
        assert_eq!(view.scroll, 0);
        view.handle_key_event(KeyEvent::from(KeyCode::PageDown)).unwrap();
        assert_eq!(view.scroll, 10);
        view.handle_key_event(KeyEvent::from(KeyCode::Home)).unwrap();
        assert_eq!(view.scroll, 0);
    }
}

use anyhow::Result;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

use crate::api::{ApiClient, Message};
use crate::commands::CommandHandler;
use crate::config::Config;
use crate::error::ApiError;
use crate::formatting::{convert_shortcodes, find_image_urls, format_timestamp};
use crate::mutation::MutationTracker;
use crate::poller::{self, PollerHandle, UpdateQueue};
use crate::state::{Applied, SyncState};
use crate::utils::{send_desktop_notification, unread_summary};
use crate::widgets::MessageView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    ChannelList,
    Composer,
    ThreadComposer,
}

pub struct App {
    pub config: Config,
    pub client: ApiClient,
    pub username: String,
    pub state: SyncState,
    pub focus: Focus,
    pub selected_channel_idx: usize,
    pub channel_view: MessageView,
    pub thread_view: MessageView,
    pub mutation: MutationTracker,
    pub status_message: Option<String>,
    pub status_expire: Option<Instant>,
    pub session_expired: bool,
    pub should_quit: bool,
    pub needs_redraw: bool,
    updates: UpdateQueue,
    channel_poller: PollerHandle,
    unread_poller: PollerHandle,
    message_poller: Option<PollerHandle>,
    reply_poller: Option<PollerHandle>,
}

impl App {
    /// Wire up the always-on pollers. The channel and unread loops run for
    /// the life of the session; message/reply pollers come and go with the
    /// open views.
    pub fn new(config: Config, client: ApiClient) -> Self {
        let username = client.session().username().unwrap_or_default();
        let updates = poller::new_queue();

        let channel_poller = poller::spawn_channel_poller(
            client.clone(),
            updates.clone(),
            Duration::from_millis(config.polling.channels_ms),
        );
        let unread_poller = poller::spawn_unread_poller(
            client.clone(),
            updates.clone(),
            Duration::from_millis(config.polling.unread_ms),
        );

        Self {
            config,
            client,
            username,
            state: SyncState::new(),
            focus: Focus::ChannelList,
            selected_channel_idx: 0,
            channel_view: MessageView::new(),
            thread_view: MessageView::new(),
            mutation: MutationTracker::new(),
            status_message: None,
            status_expire: None,
            session_expired: false,
            should_quit: false,
            needs_redraw: true,
            updates,
            channel_poller,
            unread_poller,
            message_poller: None,
            reply_poller: None,
        }
    }

    /// Drain the poller queue and reconcile every snapshot into local state.
    pub async fn process_sync_updates(&mut self) {
        let updates = poller::take_updates(&self.updates).await;
        for update in updates {
            match self.state.apply(update) {
                Applied::Replaced => {
                    self.needs_redraw = true;
                }
                Applied::Unread { rises } => {
                    self.needs_redraw = true;
                    if self.config.settings.show_notifications {
                        for rise in rises {
                            if self.state.open_channel == Some(rise.channel_id) {
                                continue;
                            }
                            send_desktop_notification(
                                "Belay",
                                &unread_summary(&rise.channel_name, rise.unread_count),
                            );
                        }
                    }
                }
                Applied::Stale => {}
                Applied::SessionExpired => {
                    self.session_expired = true;
                }
            }
        }

        if self.selected_channel_idx >= self.state.channels.len() {
            self.selected_channel_idx = self.state.channels.len().saturating_sub(1);
        }
    }

    fn handle_api_error(&mut self, action: &str, err: ApiError) {
        if err.is_auth_failure() {
            self.session_expired = true;
        } else {
            self.set_status(&format!("Failed to {}: {}", action, err));
        }
    }

    // View lifecycle. Opening a view starts its poller; closing it (or
    // switching its key) drops the old poller first so no two timers ever
    // run for the same resource.

    pub async fn open_selected_channel(&mut self) {
        let channel = match self.state.channels.get(self.selected_channel_idx) {
            Some(c) => c.clone(),
            None => return,
        };
        self.open_channel(channel.id).await;
    }

    pub async fn open_channel(&mut self, channel_id: i64) {
        self.reply_poller = None;
        self.message_poller = None;
        self.state.open_channel(channel_id);
        self.channel_view = MessageView::new();
        self.thread_view = MessageView::new();
        self.message_poller = Some(poller::spawn_message_poller(
            self.client.clone(),
            self.updates.clone(),
            Duration::from_millis(self.config.polling.messages_ms),
            channel_id,
        ));
        self.focus = Focus::Composer;
        self.needs_redraw = true;

        // Entering a channel marks it read.
        if let Err(err) = self.client.mark_channel_read(channel_id).await {
            self.handle_api_error("mark channel read", err);
        }
    }

    pub fn close_channel(&mut self) {
        self.reply_poller = None;
        self.message_poller = None;
        self.state.close_channel();
        self.focus = Focus::ChannelList;
        self.needs_redraw = true;
    }

    pub async fn open_thread(&mut self, message_id: i64) {
        self.reply_poller = None;
        self.state.open_thread(message_id);
        self.thread_view = MessageView::new();
        self.reply_poller = Some(poller::spawn_reply_poller(
            self.client.clone(),
            self.updates.clone(),
            Duration::from_millis(self.config.polling.replies_ms),
            message_id,
        ));
        self.focus = Focus::ThreadComposer;
        self.needs_redraw = true;
    }

    pub fn close_thread(&mut self) {
        self.reply_poller = None;
        self.state.close_thread();
        self.focus = if self.state.open_channel.is_some() {
            Focus::Composer
        } else {
            Focus::ChannelList
        };
        self.needs_redraw = true;
    }

    /// Message addressed as displayed: oldest is #1, newest is #len.
    pub fn message_at_display(&self, n: usize) -> Option<&Message> {
        let len = self.state.messages.len();
        if n == 0 || n > len {
            return None;
        }
        // Server order is newest first.
        self.state.messages.get(len - n)
    }

    /// Resolve `/react`-style targets for the focused view; defaults to the
    /// newest entry.
    pub fn reaction_target(&self, n: Option<usize>) -> Option<i64> {
        if self.focus == Focus::ThreadComposer {
            let len = self.state.replies.len();
            let idx = n.unwrap_or(len);
            if idx == 0 || idx > len {
                return None;
            }
            self.state.replies.get(idx - 1).map(|m| m.id)
        } else {
            let len = self.state.messages.len();
            self.message_at_display(n.unwrap_or(len)).map(|m| m.id)
        }
    }

    // Composer handling

    pub async fn submit_input(&mut self) -> Result<()> {
        let origin = self.focus;
        let raw = match origin {
            Focus::Composer => self.channel_view.input_buffer.clone(),
            Focus::ThreadComposer => self.thread_view.input_buffer.clone(),
            Focus::ChannelList => return Ok(()),
        };

        // Whitespace-only input never reaches the network.
        let input = raw.trim().to_string();
        if input.is_empty() {
            return Ok(());
        }

        if input.starts_with('/') {
            let mut handler = CommandHandler::new();
            handler.handle_command(self, &input).await?;
            self.view_for_mut(origin).clear_input();
            return Ok(());
        }

        let content = convert_shortcodes(&input);
        let applied = match origin {
            Focus::ThreadComposer => self.send_reply(&content).await,
            _ => self.send_message(&content).await,
        };
        if applied {
            self.view_for_mut(origin).clear_input();
        }
        Ok(())
    }

    fn view_for_mut(&mut self, focus: Focus) -> &mut MessageView {
        match focus {
            Focus::ThreadComposer => &mut self.thread_view,
            _ => &mut self.channel_view,
        }
    }

    pub fn focused_view_mut(&mut self) -> &mut MessageView {
        self.view_for_mut(self.focus)
    }

    // Optimistic mutators: one network call each; the server's returned
    // record is merged into local state right away and the next poll tick
    // overwrites it with the authoritative snapshot.

    pub async fn send_message(&mut self, content: &str) -> bool {
        let channel_id = match self.state.open_channel {
            Some(id) => id,
            None => {
                self.set_status("No channel open");
                return false;
            }
        };
        if !self.mutation.begin("send message") {
            return false;
        }
        match self.client.send_message(channel_id, content).await {
            Ok(message) => {
                self.mutation.complete();
                self.state.push_message(message);
                self.channel_view.scroll_to_bottom();
                self.needs_redraw = true;
                true
            }
            Err(err) => {
                self.mutation.fail(err.to_string());
                self.handle_api_error("send message", err);
                false
            }
        }
    }

    pub async fn send_reply(&mut self, content: &str) -> bool {
        let message_id = match self.state.open_thread {
            Some(id) => id,
            None => {
                self.set_status("No thread open");
                return false;
            }
        };
        if !self.mutation.begin("send reply") {
            return false;
        }
        match self.client.send_reply(message_id, content).await {
            Ok(reply) => {
                self.mutation.complete();
                self.state.push_reply(reply);
                self.thread_view.scroll_to_bottom();
                self.needs_redraw = true;
                true
            }
            Err(err) => {
                self.mutation.fail(err.to_string());
                self.handle_api_error("send reply", err);
                false
            }
        }
    }

    pub async fn add_reaction(&mut self, message_id: i64, emoji: &str) -> bool {
        if !self.mutation.begin("add reaction") {
            return false;
        }
        match self.client.add_reaction(message_id, emoji).await {
            Ok(reactions) => {
                self.mutation.complete();
                self.state.set_reactions(message_id, reactions);
                self.needs_redraw = true;
                true
            }
            Err(err) => {
                self.mutation.fail(err.to_string());
                self.handle_api_error("add reaction", err);
                false
            }
        }
    }

    pub async fn remove_reaction(&mut self, message_id: i64, emoji: &str) -> bool {
        if !self.mutation.begin("remove reaction") {
            return false;
        }
        match self.client.remove_reaction(message_id, emoji).await {
            Ok(reactions) => {
                self.mutation.complete();
                self.state.set_reactions(message_id, reactions);
                self.needs_redraw = true;
                true
            }
            Err(err) => {
                self.mutation.fail(err.to_string());
                self.handle_api_error("remove reaction", err);
                false
            }
        }
    }

    pub async fn create_channel(&mut self, name: &str) -> bool {
        if !self.mutation.begin("create channel") {
            return false;
        }
        match self.client.create_channel(name).await {
            Ok(channel) => {
                self.mutation.complete();
                self.set_status(&format!("Created #{}", channel.name));
                self.state.add_channel(channel);
                self.needs_redraw = true;
                true
            }
            Err(err) => {
                self.mutation.fail(err.to_string());
                self.handle_api_error("create channel", err);
                false
            }
        }
    }

    pub async fn rename_channel(&mut self, name: &str) -> bool {
        let channel_id = match self.state.open_channel {
            Some(id) => id,
            None => {
                self.set_status("No channel open");
                return false;
            }
        };
        if !self.mutation.begin("rename channel") {
            return false;
        }
        match self.client.rename_channel(channel_id, name).await {
            Ok(channel) => {
                self.mutation.complete();
                self.set_status(&format!("Renamed to #{}", channel.name));
                self.state.apply_rename(&channel);
                self.needs_redraw = true;
                true
            }
            Err(err) => {
                self.mutation.fail(err.to_string());
                self.handle_api_error("rename channel", err);
                false
            }
        }
    }

    pub async fn delete_channel(&mut self) -> bool {
        let channel_id = match self.state.open_channel {
            Some(id) => id,
            None => {
                self.set_status("No channel open");
                return false;
            }
        };
        if !self.mutation.begin("delete channel") {
            return false;
        }
        match self.client.delete_channel(channel_id).await {
            Ok(()) => {
                self.mutation.complete();
                if self.state.remove_channel(channel_id) {
                    self.reply_poller = None;
                    self.message_poller = None;
                    self.focus = Focus::ChannelList;
                }
                self.set_status("Channel deleted");
                self.needs_redraw = true;
                true
            }
            Err(err) => {
                self.mutation.fail(err.to_string());
                self.handle_api_error("delete channel", err);
                false
            }
        }
    }

    pub async fn mark_read(&mut self) {
        let channel_id = match self.state.open_channel {
            Some(id) => id,
            None => {
                self.set_status("No channel open");
                return;
            }
        };
        match self.client.mark_channel_read(channel_id).await {
            Ok(()) => {
                self.state.unread.insert(channel_id, 0);
                self.set_status("Marked as read");
            }
            Err(err) => self.handle_api_error("mark channel read", err),
        }
    }

    /// End the session and route back to the login prompt. The credential is
    /// dropped locally even when the server call fails.
    pub async fn logout(&mut self) {
        if let Err(err) = self.client.logout().await {
            tracing::warn!("logout call failed: {}", err);
        }
        self.session_expired = true;
    }

    // Navigation

    pub fn select_next_channel(&mut self) {
        if !self.state.channels.is_empty() {
            self.selected_channel_idx = (self.selected_channel_idx + 1) % self.state.channels.len();
        }
    }

    pub fn select_previous_channel(&mut self) {
        if !self.state.channels.is_empty() {
            self.selected_channel_idx = if self.selected_channel_idx == 0 {
                self.state.channels.len() - 1
            } else {
                self.selected_channel_idx - 1
            };
        }
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::ChannelList if self.state.open_channel.is_some() => Focus::Composer,
            Focus::Composer if self.state.open_thread.is_some() => Focus::ThreadComposer,
            Focus::Composer => Focus::ChannelList,
            Focus::ThreadComposer => Focus::ChannelList,
            Focus::ChannelList => Focus::ChannelList,
        };
        self.needs_redraw = true;
    }

    pub fn set_status(&mut self, message: &str) {
        self.status_message = Some(message.to_string());
        self.status_expire = Some(Instant::now() + Duration::from_secs(3));
        self.needs_redraw = true;
    }

    /// Expire the status line; called every event-loop iteration.
    pub fn tick(&mut self) {
        if let Some(expire) = self.status_expire {
            if Instant::now() >= expire {
                self.status_message = None;
                self.status_expire = None;
                self.needs_redraw = true;
            }
        }
    }

    pub fn toggle_reactions(&mut self) {
        self.config.settings.show_reactions = !self.config.settings.show_reactions;
        self.needs_redraw = true;
    }

    pub fn toggle_timestamps(&mut self) {
        self.config.settings.show_timestamps = !self.config.settings.show_timestamps;
        self.needs_redraw = true;
    }

    pub fn toggle_notifications(&mut self) {
        self.config.settings.show_notifications = !self.config.settings.show_notifications;
        let state = if self.config.settings.show_notifications {
            "on"
        } else {
            "off"
        };
        self.set_status(&format!("Notifications {}", state));
    }

    /// Wind the pollers down before the terminal is restored.
    pub async fn shutdown(self) {
        let App {
            channel_poller,
            unread_poller,
            message_poller,
            reply_poller,
            config,
            ..
        } = self;
        let _ = config.save();
        if let Some(p) = reply_poller {
            p.join().await;
        }
        if let Some(p) = message_poller {
            p.join().await;
        }
        unread_poller.join().await;
        channel_poller.join().await;
    }

    // Drawing

    pub fn draw(&mut self, f: &mut Frame) {
        let has_status = self.status_message.is_some();
        let main_constraints = if has_status {
            vec![Constraint::Min(0), Constraint::Length(1)]
        } else {
            vec![Constraint::Min(0)]
        };

        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints(main_constraints)
            .split(f.area());

        let columns = if self.state.open_thread.is_some() {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Length(24),
                    Constraint::Percentage(55),
                    Constraint::Min(0),
                ])
                .split(outer[0])
        } else {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(24), Constraint::Min(0)])
                .split(outer[0])
        };

        self.draw_channel_list(f, columns[0]);
        self.draw_message_pane(f, columns[1]);
        if self.state.open_thread.is_some() {
            self.draw_thread_pane(f, columns[2]);
        }

        if has_status {
            let status = Paragraph::new(self.status_message.clone().unwrap_or_default())
                .style(Style::default().bg(Color::DarkGray).fg(Color::White));
            f.render_widget(status, outer[1]);
        }
    }

    fn draw_channel_list(&self, f: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .state
            .channels
            .iter()
            .enumerate()
            .map(|(idx, channel)| {
                let unread = self.state.unread_for(channel.id);
                let selected = idx == self.selected_channel_idx;
                let mut style = if selected {
                    Style::default().bg(Color::Blue).fg(Color::White)
                } else if unread > 0 {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default()
                };
                if unread > 0 && selected {
                    style = style.add_modifier(Modifier::BOLD);
                }

                let badge = if unread > 0 {
                    format!(" ({})", unread)
                } else {
                    String::new()
                };
                let open_marker = if self.state.open_channel == Some(channel.id) {
                    "* "
                } else {
                    "  "
                };
                ListItem::new(Line::from(format!(
                    "{}# {}{}",
                    open_marker, channel.name, badge
                )))
                .style(style)
            })
            .collect();

        let title = if self.focus == Focus::ChannelList {
            "Channels [FOCUSED]"
        } else {
            "Channels"
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(if self.focus == Focus::ChannelList {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            });
        f.render_widget(List::new(items).block(block), area);
    }

    fn message_lines<'a>(&self, messages: impl Iterator<Item = &'a Message>) -> Vec<Line<'static>> {
        let mut lines: Vec<Line> = Vec::new();
        for (idx, msg) in messages.enumerate() {
            let is_own = msg.username == self.username;
            let name_style = if is_own {
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            };

            let mut spans: Vec<Span> = Vec::new();
            spans.push(Span::styled(
                format!("#{} ", idx + 1),
                Style::default().fg(Color::DarkGray),
            ));
            if self.config.settings.show_timestamps {
                spans.push(Span::styled(
                    format!("[{}] ", format_timestamp(&msg.created_at)),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            spans.push(Span::styled(format!("{}: ", msg.username), name_style));
            spans.push(Span::raw(msg.content.clone()));

            if msg.reply_count > 0 {
                spans.push(Span::styled(
                    format!(" [{} replies]", msg.reply_count),
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                ));
            }

            if self.config.settings.show_reactions && !msg.reactions.is_empty() {
                let reaction_str: String = msg
                    .reactions
                    .iter()
                    .map(|r| {
                        if r.count > 1 {
                            format!("{}x{}", r.emoji, r.count)
                        } else {
                            r.emoji.clone()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                spans.push(Span::styled(
                    format!("  {}", reaction_str),
                    Style::default().fg(Color::DarkGray),
                ));
            }

            lines.push(Line::from(spans));

            for url in find_image_urls(&msg.content) {
                lines.push(Line::from(Span::styled(
                    format!("   [image] {}", url),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                )));
            }
        }
        lines
    }

    fn draw_message_pane(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(area);

        let channel_id = self.state.open_channel;
        let title = match channel_id.and_then(|id| self.state.channel_name(id)) {
            Some(name) => format!("# {}", name),
            None => "Belay".to_string(),
        };

        if channel_id.is_none() {
            let welcome = Paragraph::new("Select a channel to start messaging")
                .block(Block::default().borders(Borders::ALL).title(title));
            f.render_widget(welcome, chunks[0]);
            self.draw_input(f, chunks[1], Focus::Composer);
            return;
        }

        // Server order is newest first; display oldest to newest.
        let lines = self.message_lines(self.state.messages.iter().rev());
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(chunks[0]);
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });

        let total_lines = paragraph
            .line_count(inner.width)
            .saturating_sub(2); // block border rows
        let max_scroll = total_lines.saturating_sub(inner.height as usize);
        self.channel_view.last_max_scroll = max_scroll;
        let scroll = self.channel_view.scroll_offset.min(max_scroll);

        f.render_widget(paragraph.scroll((scroll as u16, 0)), chunks[0]);
        self.draw_input(f, chunks[1], Focus::Composer);
    }

    fn draw_thread_pane(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(area);

        let thread_id = self.state.open_thread;
        let parent = thread_id.and_then(|id| self.state.messages.iter().find(|m| m.id == id));
        let title = match parent {
            Some(p) => format!("Thread: {}", p.username),
            None => "Thread".to_string(),
        };

        let mut lines: Vec<Line> = Vec::new();
        if let Some(p) = parent {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{}: ", p.username),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(p.content.clone()),
            ]));
            lines.push(Line::from(Span::styled(
                "---",
                Style::default().fg(Color::DarkGray),
            )));
        }
        lines.extend(self.message_lines(self.state.replies.iter()));

        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(chunks[0]);
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });

        let total_lines = paragraph.line_count(inner.width).saturating_sub(2);
        let max_scroll = total_lines.saturating_sub(inner.height as usize);
        self.thread_view.last_max_scroll = max_scroll;
        let scroll = self.thread_view.scroll_offset.min(max_scroll);

        f.render_widget(paragraph.scroll((scroll as u16, 0)), chunks[0]);
        self.draw_input(f, chunks[1], Focus::ThreadComposer);
    }

    fn draw_input(&self, f: &mut Frame, area: Rect, owner: Focus) {
        let focused = self.focus == owner;
        let view = match owner {
            Focus::ThreadComposer => &self.thread_view,
            _ => &self.channel_view,
        };

        let style = if focused {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Gray)
        };
        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(area);
        let input = Paragraph::new(view.input_buffer.as_str())
            .style(style)
            .block(block);
        f.render_widget(input, area);

        if focused {
            let col = UnicodeWidthStr::width(&view.input_buffer[..view.input_cursor])
                .min(inner.width.saturating_sub(1) as usize);
            f.set_cursor_position((inner.x + col as u16, inner.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::mutation::MutationState;
    use crate::session::SessionStore;

    fn test_app(name: &str) -> App {
        let mut config = Config {
            base_url: "http://127.0.0.1:9".to_string(),
            polling: Default::default(),
            settings: Default::default(),
            config_dir: std::env::temp_dir(),
        };
        // Keep the background pollers quiet for the duration of the test.
        config.polling.channels_ms = 60_000;
        config.polling.unread_ms = 60_000;
        let session = SessionStore::open(std::env::temp_dir().join(format!(
            "belay_app_test_{}_{}.json",
            std::process::id(),
            name
        )));
        session.clear();
        let client = ApiClient::new(&config.base_url, session);
        App::new(config, client)
    }

    fn message(id: i64, content: &str) -> Message {
        Message {
            id,
            channel_id: 7,
            user_id: 1,
            username: "alice".to_string(),
            content: content.to_string(),
            created_at: "2024-03-01 12:00:00".to_string(),
            replies_to: None,
            reply_count: 0,
            reactions: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_whitespace_input_performs_no_call() {
        let mut app = test_app("whitespace");
        app.state.open_channel = Some(7);
        app.focus = Focus::Composer;
        app.channel_view.input_buffer = "   ".to_string();

        app.submit_input().await.unwrap();

        // send_message transitions the tracker before any request; staying
        // Idle means nothing was attempted.
        assert_eq!(*app.mutation.state(), MutationState::Idle);
        assert_eq!(app.channel_view.input_buffer, "   ");
    }

    #[tokio::test]
    async fn test_message_display_numbering_is_oldest_first() {
        let mut app = test_app("numbering");
        app.state.open_channel = Some(7);
        // Server order: newest first.
        app.state.messages = vec![message(3, "newest"), message(2, "mid"), message(1, "oldest")];

        assert_eq!(app.message_at_display(1).unwrap().id, 1);
        assert_eq!(app.message_at_display(3).unwrap().id, 3);
        assert!(app.message_at_display(0).is_none());
        assert!(app.message_at_display(4).is_none());
    }

    #[tokio::test]
    async fn test_reaction_target_defaults_to_newest() {
        let mut app = test_app("reaction_target");
        app.state.open_channel = Some(7);
        app.state.messages = vec![message(3, "newest"), message(1, "oldest")];
        app.focus = Focus::Composer;

        assert_eq!(app.reaction_target(None), Some(3));
        assert_eq!(app.reaction_target(Some(1)), Some(1));

        app.state.open_thread = Some(3);
        app.state.replies = vec![message(10, "first"), message(11, "last")];
        app.focus = Focus::ThreadComposer;
        assert_eq!(app.reaction_target(None), Some(11));
        assert_eq!(app.reaction_target(Some(1)), Some(10));
        assert_eq!(app.reaction_target(Some(5)), None);
    }
}

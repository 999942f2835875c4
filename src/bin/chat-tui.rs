use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use futures::{SinkExt, StreamExt};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem};
use ratatui::Terminal;
use tracing_appender::rolling::Rotation;
use std::borrow::Cow;
use std::io;
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tui_textarea::{Input, Key, TextArea};
use lobby_chat::{connection_refused, parse_socket_addr, file_logging};
use lobby_chat::protocol::{self, EXIT, MENU, PRIVATE, TO, WHO};

const MENU_LINES: [&str; 6] = [
    "-- menu --",
    "type anything to chat with everyone",
    "who - list online users",
    "rename=<name> - change your name",
    "private - private mode, where <name>=<message> whispers to <name>",
    "exit - leave private mode, menu - show this again",
];

const SAYS: &str = " says";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Public,
    Private,
}

fn textarea_new(mode: Mode) -> TextArea<'static> {
    let mut textarea = TextArea::default();
    textarea.set_cursor_line_style(Style::default());
    let (title, placeholder) = match mode {
        Mode::Public => ("Send message", "Start typing... (menu for help)"),
        Mode::Private => ("Private message", "<name>=<message>, exit to go back"),
    };
    textarea.set_placeholder_text(placeholder);
    textarea.set_block(
        Block::default().borders(Borders::ALL).title(title),
    );
    textarea
}

/// Turns an input line into what goes over the wire, or handles it
/// locally and returns None.
fn outgoing(line: String, mode: &mut Mode, messages: &mut Vec<String>) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case(MENU) {
        messages.extend(MENU_LINES.iter().map(|l| l.to_string()));
        None
    } else if trimmed.eq_ignore_ascii_case(PRIVATE) {
        *mode = Mode::Private;
        None
    } else if *mode == Mode::Private && trimmed.eq_ignore_ascii_case(EXIT) {
        *mode = Mode::Public;
        None
    } else if *mode == Mode::Private
        && !trimmed.eq_ignore_ascii_case(WHO)
        && protocol::strip_token(trimmed, TO).is_none()
    {
        Some(format!("{TO}{trimmed}"))
    } else {
        Some(line)
    }
}

fn messages_to_list(
    msgs: &[String],
    min_lines: usize,
    max_length: usize,
) -> List<'_> {
    let mut list_items = Vec::new();
    // only interested in most recent msgs
    'outer: for msg in msgs.iter().rev() {
        let speaker_end = msg.find(SAYS).map(|i| i + SAYS.len());
        let lines = textwrap::wrap(
            msg,
            textwrap::Options::new(max_length)
                .wrap_algorithm(textwrap::WrapAlgorithm::new_optimal_fit()),
        );
        let mut styled_lines = Vec::new();
        match speaker_end {
            Some(end) if lines.first().is_some_and(|l| l.len() >= end) => {
                let mut lines = lines.into_iter();
                let first_line = lines.next().unwrap_or_default();
                let (speaker, said) = first_line.split_at(end);
                styled_lines.push(Line::from(vec![
                    speaker.to_owned().bold(),
                    Span::raw(said.to_owned()),
                ]));
                for line in lines {
                    styled_lines.push(Line::from(line.into_owned()));
                }
            }
            _ => styled_lines.extend(
                lines
                    .into_iter()
                    .map(|line| line.into_owned().dim().italic().into()),
            ),
        }
        for line in styled_lines.into_iter().rev() {
            list_items.push(ListItem::new(line));
            if list_items.len() >= min_lines {
                break 'outer;
            }
        }
    }
    // pad with empty lines
    while list_items.len() < min_lines {
        list_items.push(ListItem::new(Cow::from("")));
    }
    list_items.reverse();
    List::new(list_items)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let addr = parse_socket_addr();
    let mut conn = match TcpStream::connect(addr).await {
        Ok(conn) => conn,
        Err(err) => {
            match err.kind() {
                std::io::ErrorKind::ConnectionRefused => {
                    println!("{}", connection_refused(addr));
                    std::process::exit(1)
                }
                // got unexpected err, re-throw
                _ => Err(err)?,
            }
        }
    };

    // the server names us after our address until we rename
    let mut name = conn.local_addr()?.to_string();
    let _guard = file_logging(Rotation::NEVER, &format!("chat-tui.{}.log", name.replace(':', "_")));

    let (reader, writer) = conn.split();
    let mut tcp_sink = FramedWrite::new(writer, LinesCodec::new());
    let mut tcp_stream = FramedRead::new(reader, LinesCodec::new());

    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    enable_raw_mode()?;
    crossterm::execute!(stdout, EnterAlternateScreen,)?;
    let backend = CrosstermBackend::new(stdout);
    let mut term = Terminal::new(backend)?;

    let mut mode = Mode::Public;
    let mut textarea = textarea_new(mode);
    let layout = Layout::default()
        .constraints([Constraint::Percentage(100), Constraint::Min(3)]);

    let mut messages: Vec<String> = MENU_LINES.iter().map(|l| l.to_string()).collect();

    let mut term_stream = crossterm::event::EventStream::new();

    loop {
        let draw_res = term.draw(|f| {
            let chunks = layout.split(f.size());

            let msgs_height = chunks[0].height.saturating_sub(2); // -2 for borders
            let msgs_width = chunks[0].width.saturating_sub(2); // -2 for borders
            let msgs_title = match mode {
                Mode::Public => format!("Lobby - {name}"),
                Mode::Private => format!("Lobby - {name} (private)"),
            };
            let msgs = messages_to_list(
                &messages,
                msgs_height.into(),
                msgs_width.into(),
            )
            .block(Block::default().borders(Borders::ALL).title(msgs_title));
            f.render_widget(msgs, chunks[0]);

            // render input box
            let widget = textarea.widget();
            f.render_widget(widget, chunks[1]);
        });

        match draw_res {
            Ok(_) => (),
            Err(_) => break,
        };

        tokio::select! {
            term_event = term_stream.next() => {
                if let Some(event) = term_event {
                    let event = match event {
                        Ok(event) => event,
                        Err(_) => break,
                    };
                    match event.into() {
                        // escape
                        Input { key: Key::Esc, .. } |
                        // ctrl+c
                        Input { key: Key::Char('c'), ctrl: true, .. } |
                        // ctrl+d
                        Input { key: Key::Char('d'), ctrl: true, .. }  => break,
                        // enter
                        Input { key: Key::Enter, .. } => {
                            if textarea.is_empty() {
                                continue;
                            }
                            let mut sent_all = true;
                            for line in textarea.into_lines() {
                                let Some(line) = outgoing(line, &mut mode, &mut messages) else {
                                    continue;
                                };
                                tracing::info!("SENT {line}");
                                if tcp_sink.send(line).await.is_err() {
                                    sent_all = false;
                                    break;
                                }
                            }
                            if !sent_all {
                                break;
                            }
                            textarea = textarea_new(mode);
                        }
                        // forward input to textarea
                        input => {
                            textarea.input_without_shortcuts(input);
                        }
                    }
                } else {
                    break;
                }
            },
            tcp_event = tcp_stream.next() => match tcp_event {
                Some(event) => {
                    let server_msg = match event {
                        Ok(msg) => msg,
                        Err(_) => break,
                    };
                    if let Some(new_name) = protocol::parse_rename_ok(&server_msg) {
                        name = new_name.to_owned();
                    }
                    tracing::info!(" GOT {server_msg}");
                    messages.push(server_msg);
                },
                None => break,
            },
        }
    }

    disable_raw_mode()?;
    crossterm::execute!(term.backend_mut(), LeaveAlternateScreen,)?;
    term.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(line: &str, mode: &mut Mode) -> Option<String> {
        outgoing(line.to_owned(), mode, &mut Vec::new())
    }

    #[test]
    fn private_mode_wraps_lines() {
        let mut mode = Mode::Public;
        assert_eq!(send("bob=hi", &mut mode).as_deref(), Some("bob=hi"));
        assert_eq!(send("PRIVATE", &mut mode), None);
        assert!(mode == Mode::Private);
        assert_eq!(send("bob=hi", &mut mode).as_deref(), Some("to=bob=hi"));
        assert_eq!(send("to=bob=hi", &mut mode).as_deref(), Some("to=bob=hi"));
        assert_eq!(send("who", &mut mode).as_deref(), Some("who"));
        assert_eq!(send("exit", &mut mode), None);
        assert!(mode == Mode::Public);
        assert_eq!(send("exit", &mut mode).as_deref(), Some("exit"));
    }

    #[test]
    fn menu_stays_local() {
        let mut messages = Vec::new();
        let mut mode = Mode::Public;
        assert_eq!(outgoing("menu".into(), &mut mode, &mut messages), None);
        assert_eq!(messages.len(), MENU_LINES.len());
    }
}

//! 界面渲染
//!
//! 未连接时绘制落地页；已连接时绘制标题栏（地址、余额、Gas）、左侧区块列表、右侧内容区、底部快捷键提示，
//! 铸造对话框、助手面板、新手引导与完成证书以居中弹层叠加。

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::core::wallet::short_address;
use crate::core::SessionPhase;
use crate::flows::{MintPhase, OnboardingGuide};
use crate::llm::Role;
use crate::ui::app::App;

/// 余额与 Gas 的显示精度
fn peth(value: f64) -> String {
    format!("{:.4} pETH", value)
}

fn gwei_like(value: f64) -> String {
    format!("{:.7}", value)
}

/// 居中弹层区域（按百分比）
fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// 绘制一帧
pub fn draw(f: &mut Frame, app: &App) {
    match app.session.phase() {
        SessionPhase::Uninitialized => draw_loading(f),
        SessionPhase::Disconnected => draw_landing(f, app),
        SessionPhase::Connected => {
            draw_dashboard(f, app);
            if app.chat.is_open() {
                draw_assistant(f, app);
            } else if app.mint.is_open() {
                draw_mint_dialog(f, app);
            } else if app.certificate.is_some() {
                draw_certificate(f, app);
            } else if OnboardingGuide::should_show(&app.session) {
                draw_onboarding(f, app);
            }
        }
    }
}

fn draw_loading(f: &mut Frame) {
    let p = Paragraph::new("Loading…")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(p, f.area());
}

fn draw_landing(f: &mut Frame, app: &App) {
    let owner = &app.portfolio.owner;
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            owner.name.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Decentralized Portfolio",
            Style::default().fg(Color::Cyan),
        )),
        Line::from(""),
        Line::from(owner.tagline.clone()),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to connect your wallet",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    if !app.session.minted_blocks.is_empty() {
        lines.push(Line::from(Span::styled(
            format!(
                "{}/{} blocks already mined",
                app.session.minted_blocks.len(),
                app.portfolio.blocks.len()
            ),
            Style::default().fg(Color::DarkGray),
        )));
    }
    if let Some(status) = &app.status {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(status.clone(), Style::default().fg(Color::Gray))));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title_bottom(Line::from(Span::styled(
            " Enter 连接钱包 │ q 退出 ",
            Style::default().fg(Color::DarkGray),
        )));
    let p = Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    f.render_widget(p, f.area());
}

fn draw_dashboard(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(3)])
        .split(f.area());

    let s = &app.session;
    let header = Line::from(vec![
        Span::styled(
            format!(" {} ", app.portfolio.owner.name),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
        Span::styled(short_address(&s.wallet_address), Style::default().fg(Color::Cyan)),
        Span::raw(" │ "),
        Span::styled(peth(s.wallet_balance), Style::default().fg(Color::Green)),
        Span::raw(" │ Gas "),
        Span::styled(gwei_like(s.gas_price), Style::default().fg(Color::Magenta)),
        Span::raw(format!(
            " │ {}/{} mined",
            s.minted_blocks.len(),
            app.portfolio.blocks.len()
        )),
    ]);
    f.render_widget(
        Paragraph::new(header).block(Block::default().borders(Borders::ALL)),
        chunks[0],
    );

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[1]);

    let items: Vec<ListItem> = app
        .portfolio
        .blocks
        .iter()
        .map(|b| {
            let (mark, color) = if s.is_minted(b.id) {
                ("■ ", Color::Green)
            } else {
                ("□ ", Color::DarkGray)
            };
            ListItem::new(Line::from(vec![
                Span::styled(mark, Style::default().fg(color)),
                Span::raw(b.title.clone()),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(Block::default().title(" Blocks ").borders(Borders::ALL))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected(Some(app.selected));
    f.render_stateful_widget(list, body[0], &mut state);

    let content = match app.selected_block() {
        Some(b) if s.is_minted(b.id) => Paragraph::new(Text::from(
            b.text_lines().into_iter().map(Line::from).collect::<Vec<_>>(),
        ))
        .block(Block::default().title(format!(" {} ", b.title)).borders(Borders::ALL)),
        Some(b) => Paragraph::new(Text::from(vec![
            Line::from(Span::styled("Locked block", Style::default().fg(Color::DarkGray))),
            Line::from(""),
            Line::from(format!("Complexity: {}", b.complexity)),
            Line::from(format!("Engagement: {}", b.engagement)),
            Line::from(""),
            Line::from("Press m to mine this block and reveal its content."),
        ]))
        .block(Block::default().title(format!(" {} ", b.title)).borders(Borders::ALL)),
        None => Paragraph::new("").block(Block::default().borders(Borders::ALL)),
    };
    f.render_widget(content.wrap(Wrap { trim: false }), body[1]);

    let hint = " ↑↓ 选择 │ m 铸造 │ f 水龙头 │ a 助手 │ d 断开 │ q 退出 ";
    let footer = Paragraph::new(app.status.clone().unwrap_or_default()).block(
        Block::default()
            .borders(Borders::ALL)
            .title_bottom(Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray)))),
    );
    f.render_widget(footer, chunks[2]);
}

fn draw_mint_dialog(f: &mut Frame, app: &App) {
    let area = centered(f.area(), 60, 40);
    f.render_widget(Clear, area);
    let title = app
        .mint
        .block()
        .and_then(|id| app.portfolio.get(id))
        .map(|b| format!(" Mine '{}' ", b.title))
        .unwrap_or_else(|| " Mine ".to_string());
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    match app.mint.phase() {
        MintPhase::Mining { progress } => {
            let gauge = Gauge::default()
                .block(block)
                .gauge_style(Style::default().fg(Color::Yellow))
                .percent(u16::from(*progress))
                .label(format!("Mining… {}%", progress));
            f.render_widget(gauge, area);
        }
        phase => {
            let lines = match phase {
                MintPhase::Calculating => vec![Line::from("Calculating minting cost…")],
                MintPhase::Confirm(q) => vec![
                    Line::from(format!("Base cost: {}", peth(q.base_cost))),
                    Line::from(format!("Gas fee:   {}", peth(q.gas_fee))),
                    Line::from(Span::styled(
                        format!("Total:     {}", peth(q.total)),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(""),
                    Line::from(format!("Balance:   {}", peth(app.session.wallet_balance))),
                    Line::from(""),
                    Line::from("Enter confirm │ Esc cancel"),
                ],
                MintPhase::Done => vec![
                    Line::from(Span::styled("Block mined!", Style::default().fg(Color::Green))),
                    Line::from(""),
                    Line::from("Enter close"),
                ],
                MintPhase::Error(msg) => vec![
                    Line::from(Span::styled(msg.clone(), Style::default().fg(Color::Red))),
                    Line::from(""),
                    Line::from("Enter close"),
                ],
                MintPhase::Idle | MintPhase::Mining { .. } => Vec::new(),
            };
            f.render_widget(
                Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true }).block(block),
                area,
            );
        }
    }
}

fn draw_assistant(f: &mut Frame, app: &App) {
    let area = centered(f.area(), 70, 80);
    f.render_widget(Clear, area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    for m in app.chat.transcript() {
        let (prefix, color) = match m.role {
            Role::User => ("You ", Color::Cyan),
            Role::Assistant => ("AI  ", Color::Green),
            Role::System => ("Sys ", Color::Gray),
        };
        lines.push(Line::from(vec![
            Span::styled(prefix, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::raw(m.content.clone()),
        ]));
    }
    if app.chat.is_waiting() {
        lines.push(Line::from(Span::styled("AI  …", Style::default().fg(Color::DarkGray))));
    }
    // 只显示最后一屏
    let height = chunks[0].height.saturating_sub(2) as usize;
    let skip = lines.len().saturating_sub(height);
    let visible: Vec<Line> = lines.into_iter().skip(skip).collect();

    f.render_widget(
        Paragraph::new(Text::from(visible))
            .wrap(Wrap { trim: false })
            .block(Block::default().title(" AI Assistant ").borders(Borders::ALL)),
        chunks[0],
    );
    let input_title = if app.chat.is_waiting() { " 等待回复… " } else { " 输入 " };
    f.render_widget(
        Paragraph::new(app.chat.input.as_str()).block(
            Block::default()
                .title(input_title)
                .title_bottom(Line::from(Span::styled(
                    " Enter 发送 │ Esc 关闭 ",
                    Style::default().fg(Color::DarkGray),
                )))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        ),
        chunks[1],
    );
}

fn draw_onboarding(f: &mut Frame, app: &App) {
    let area = centered(f.area(), 60, 40);
    f.render_widget(Clear, area);
    let step = app.guide.current();
    let (pos, total) = app.guide.position();
    let text = Text::from(vec![
        Line::from(Span::styled(step.title, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(step.description),
    ]);
    let block = Block::default()
        .title(format!(" Guide {pos}/{total} "))
        .title_bottom(Line::from(Span::styled(
            " Enter 下一步 │ ← 上一步 │ Esc 跳过 ",
            Style::default().fg(Color::DarkGray),
        )))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }).block(block), area);
}

fn draw_certificate(f: &mut Frame, app: &App) {
    let Some(cert) = &app.certificate else {
        return;
    };
    let area = centered(f.area(), 60, 50);
    f.render_widget(Clear, area);
    let lines: Vec<Line> = cert.text_lines().into_iter().map(Line::from).collect();
    f.render_widget(
        Paragraph::new(Text::from(lines))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Green)),
            ),
        area,
    );
}

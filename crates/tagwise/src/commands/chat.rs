use super::{build_client, load_config};
use std::io::Write;
use std::path::Path;
use tagwise_chat::ChatService;
use tagwise_upstream::CancellationToken;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Quit,
    Summary,
    Message(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Empty,
        "/quit" | "/exit" => Input::Quit,
        "/summary" => Input::Summary,
        text => Input::Message(text),
    }
}

pub async fn run(config: Option<&Path>, user: &str) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let service = ChatService::new(build_client(&config)?);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Chatting as {user}. /summary shows what I know about you, /quit exits.");
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Summary => {
                let cancel = CancellationToken::new();
                match service.summarize(user, &cancel).await {
                    Ok(summary) if summary.is_empty() => println!("(nothing to summarize yet)"),
                    Ok(summary) => println!("{summary}"),
                    Err(err) => eprintln!("error ({}): {err}", err.kind().as_str()),
                }
            }
            Input::Message(text) => {
                let request_id = uuid::Uuid::new_v4().to_string();
                let turn = CancellationToken::new();
                let respond = service.respond(user, text, Some(request_id.as_str()), &turn);
                tokio::pin!(respond);

                // Ctrl-C cancels the turn, not the session
                let finished = tokio::select! {
                    result = &mut respond => Some(result),
                    _ = tokio::signal::ctrl_c() => None,
                };
                let result = match finished {
                    Some(result) => result,
                    None => {
                        turn.cancel();
                        respond.await
                    }
                };

                match result {
                    Ok(reply) => println!("{reply}"),
                    Err(err) => eprintln!("error ({}): {err}", err.kind().as_str()),
                }
            }
        }
    }

    if let Some(session) = service.store().get(user) {
        tracing::info!(
            user_id = user,
            messages = session.message_count(),
            "chat session ended"
        );
    }
    service.close(user);
    Ok(())
}

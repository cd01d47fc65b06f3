//! Terminal decision prompt.

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

use vouch_protocol::authz::DecisionPrompt;
use vouch_protocol::transaction::Transaction;

/// Shows the transaction text once, then reads one line per question.
pub struct TerminalPrompt<R, W> {
    reader: R,
    writer: W,
    /// Id of the transaction whose text is already on screen.
    shown: Option<u64>,
}

impl TerminalPrompt<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> TerminalPrompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            shown: None,
        }
    }
}

impl<R, W> TerminalPrompt<R, W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn say(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.flush().await
    }
}

#[async_trait]
impl<R, W> DecisionPrompt for TerminalPrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn ask(&mut self, transaction: &Transaction) -> io::Result<Option<String>> {
        if self.shown != Some(transaction.id()) {
            self.say(&format!("Message:\n\t{}\n", transaction.text()))
                .await?;
            self.shown = Some(transaction.id());
        }
        self.say("Do you want to approve this? [y/N] ").await?;

        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    async fn reject(&mut self, _reply: &str) -> io::Result<()> {
        self.say("Invalid entry.\n\n").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vouch_protocol::authz::decide;
    use vouch_protocol::transaction::{Decision, Status};

    fn txn() -> Transaction {
        Transaction::new(5, "Wire $500", Status::Unauthenticated)
    }

    #[tokio::test]
    async fn shows_text_and_reads_a_line() {
        let mut prompt = TerminalPrompt::new(&b"y\n"[..], Vec::new());

        let reply = prompt.ask(&txn()).await.unwrap();

        assert_eq!(reply.as_deref(), Some("y\n"));
        let shown = String::from_utf8(prompt.writer).unwrap();
        assert!(shown.contains("\tWire $500\n"));
        assert!(shown.ends_with("[y/N] "));
    }

    #[tokio::test]
    async fn end_of_input_is_none() {
        let mut prompt = TerminalPrompt::new(&b""[..], Vec::new());
        assert_eq!(prompt.ask(&txn()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalid_entry_then_deny() {
        let mut prompt = TerminalPrompt::new(&b"maybe\n\n"[..], Vec::new());

        let decision = decide(&mut prompt, &txn()).await.unwrap();

        assert_eq!(decision, Decision::Deny);
        let shown = String::from_utf8(prompt.writer).unwrap();
        assert_eq!(shown.matches("Do you want to approve this?").count(), 2);
        assert_eq!(shown.matches("Wire $500").count(), 1);
        assert!(shown.contains("Invalid entry."));
    }

    #[tokio::test]
    async fn a_new_transaction_is_shown_again() {
        let mut prompt = TerminalPrompt::new(&b"y
y
"[..], Vec::new());

        prompt.ask(&txn()).await.unwrap();
        prompt
            .ask(&Transaction::new(6, "Wire $900", Status::Unauthenticated))
            .await
            .unwrap();

        let shown = String::from_utf8(prompt.writer).unwrap();
        assert_eq!(shown.matches("Message:").count(), 2);
        assert!(shown.contains("\tWire $900\n"));
    }
}

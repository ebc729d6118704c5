//! Command grammar for the script driver: one directive per non-blank,
//! non-comment line, matching the operations the menu-driven interface
//! lists, minus the menu itself.

use anyhow::{bail, Context, Result};
use corelib::{Document, NodeId, Ring, TickKind};

/// What the run loop should do after a command finishes.
pub enum CommandResult {
    Continue,
    Exit,
}

#[derive(Debug)]
pub enum Command {
    CreateNode {
        id: NodeId,
    },
    JoinNode {
        id: NodeId,
        bootstrap: NodeId,
    },
    AddDocument {
        ctx: NodeId,
        filename: String,
        data: Vec<u8>,
    },
    QueryDocument {
        ctx: NodeId,
        filename: String,
    },
    PrintRing,
    PrintNode {
        id: NodeId,
    },
    StabilizeAll,
    FixFingersAll,
    CheckPredecessorsAll,
    StabilizeNode {
        id: NodeId,
    },
    FixFingersNode {
        id: NodeId,
    },
    CheckPredecessorNode {
        id: NodeId,
    },
    Leave {
        id: NodeId,
    },
    Fail {
        id: NodeId,
    },
    Exit,
}

impl Command {
    /// Parses one script line. Blank lines and `#`-prefixed comments parse
    /// to `None` and are skipped by the caller.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let mut parts = line.split_whitespace();
        let op = parts.next().context("empty command line")?;
        let cmd = match op {
            "create-node" => Command::CreateNode {
                id: parse_id(&mut parts, "create-node")?,
            },
            "join-node" => {
                let id = parse_id(&mut parts, "join-node")?;
                let bootstrap = NodeId::from_hex(
                    parts
                        .next()
                        .context("join-node requires <id> <bootstrap-id>")?,
                )?;
                Command::JoinNode { id, bootstrap }
            }
            "add-document" => {
                let ctx = parse_id(&mut parts, "add-document")?;
                let filename = parts
                    .next()
                    .context("add-document requires <ctx-id> <filename> [data...]")?
                    .to_string();
                let data = parts.collect::<Vec<_>>().join(" ").into_bytes();
                Command::AddDocument { ctx, filename, data }
            }
            "query-document" => {
                let ctx = parse_id(&mut parts, "query-document")?;
                let filename = parts
                    .next()
                    .context("query-document requires <ctx-id> <filename>")?
                    .to_string();
                Command::QueryDocument { ctx, filename }
            }
            "print-ring" => Command::PrintRing,
            "print-node" => Command::PrintNode {
                id: parse_id(&mut parts, "print-node")?,
            },
            "stabilize-all" => Command::StabilizeAll,
            "fix-fingers-all" => Command::FixFingersAll,
            "check-predecessors-all" => Command::CheckPredecessorsAll,
            "stabilize-node" => Command::StabilizeNode {
                id: parse_id(&mut parts, "stabilize-node")?,
            },
            "fix-fingers-node" => Command::FixFingersNode {
                id: parse_id(&mut parts, "fix-fingers-node")?,
            },
            "check-predecessor-node" => Command::CheckPredecessorNode {
                id: parse_id(&mut parts, "check-predecessor-node")?,
            },
            "leave" => Command::Leave {
                id: parse_id(&mut parts, "leave")?,
            },
            "fail" => Command::Fail {
                id: parse_id(&mut parts, "fail")?,
            },
            "exit" => Command::Exit,
            other => bail!("unrecognized command {other:?}"),
        };
        Ok(Some(cmd))
    }

    pub async fn run(self, ring: &Ring) -> Result<CommandResult> {
        match self {
            Command::CreateNode { id } => {
                let handle = ring.create_node(id)?;
                println!("created {handle}");
            }
            Command::JoinNode { id, bootstrap } => {
                let handle = ring.join_node(id, bootstrap).await?;
                println!("joined {handle}");
            }
            Command::AddDocument { ctx, filename, data } => {
                let doc = Document::new(filename.clone(), data);
                let target = ring.add_document(&ctx, doc).await?;
                println!("stored {filename} at {target}");
            }
            Command::QueryDocument { ctx, filename } => {
                let result = ring.query_document(&ctx, filename).await?;
                match &result.found {
                    Some(doc) => {
                        println!("Document found");
                        println!("{}", doc.filename);
                        println!("{}", String::from_utf8_lossy(&doc.data));
                    }
                    None => println!("Document not found"),
                }
                let path = result
                    .path
                    .iter()
                    .map(|h| h.id.to_string())
                    .collect::<Vec<_>>()
                    .join(" -> ");
                println!("resolved at {} (path: {path})", result.resolved_at);
            }
            Command::PrintRing => print!("{}", ring.describe().await),
            Command::PrintNode { id } => print!("{}", ring.describe_node(&id).await?),
            Command::StabilizeAll => ring.stabilize_all().await,
            Command::FixFingersAll => ring.fix_fingers_all().await,
            Command::CheckPredecessorsAll => ring.check_predecessors_all().await,
            Command::StabilizeNode { id } => ring.tick_node(&id, TickKind::Stabilize).await?,
            Command::FixFingersNode { id } => ring.tick_node(&id, TickKind::FixFingers).await?,
            Command::CheckPredecessorNode { id } => {
                ring.tick_node(&id, TickKind::CheckPredecessor).await?
            }
            Command::Leave { id } => ring.leave(&id).await?,
            Command::Fail { id } => ring.fail(&id).await?,
            Command::Exit => return Ok(CommandResult::Exit),
        }
        Ok(CommandResult::Continue)
    }
}

fn parse_id<'a>(parts: &mut impl Iterator<Item = &'a str>, op: &str) -> Result<NodeId> {
    let raw = parts
        .next()
        .with_context(|| format!("{op} requires a node id"))?;
    Ok(NodeId::from_hex(raw)?)
}

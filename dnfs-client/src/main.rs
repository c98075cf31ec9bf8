//! Line-oriented client REPL (§6). Deliberately thin: it logs in to the
//! Name Server, translates each typed command into the matching NS
//! request, and for file-content operations opens a direct connection to
//! whichever Storage Server the NS resolves. Output follows §7: `SUCCESS[:
//! <msg>]` to stdout, `ERROR: <msg>` to stderr, raw bytes to stdout for
//! READ/STREAM/VIEWCHECKPOINT.

mod error;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing_subscriber::EnvFilter;

use dnfs_proto::constants::MAX_PAYLOAD;
use dnfs_proto::payloads::*;
use dnfs_proto::{read_message, write_message, MsgType};

use error::{Error, Result};

type StdinLines = tokio::io::Lines<BufReader<tokio::io::Stdin>>;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(err) = run().await {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let ns_ip = args.next().ok_or_else(usage)?;
    let ns_port: u16 = args.next().ok_or_else(usage)?.parse().map_err(|_| usage())?;

    let mut ns = TcpStream::connect((ns_ip.as_str(), ns_port)).await?;
    ns.set_nodelay(true)?;

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    print!("Enter username: ");
    flush_stdout()?;
    let username = match stdin.next_line().await? {
        Some(line) => line.trim().to_string(),
        None => return Ok(()),
    };

    let login = ReqLogin { username: username.clone() };
    let payload = ns_call(&mut ns, MsgType::Login, &login.encode()?, MsgType::LoginOk).await?;
    println!("SUCCESS: {}", ResSuccess::decode(&payload)?.msg);

    loop {
        print!("> ");
        flush_stdout()?;
        let line = match stdin.next_line().await? {
            Some(l) => l,
            None => break,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") {
            break;
        }
        if line.eq_ignore_ascii_case("help") {
            print_help();
            continue;
        }
        if let Err(err) = dispatch(&mut ns, &username, line, &mut stdin).await {
            eprintln!("ERROR: {err}");
        }
    }
    Ok(())
}

fn usage() -> Error {
    Error::BadCommand("usage: dnfs-client <ns_ip> <ns_port>".to_string())
}

fn flush_stdout() -> Result<()> {
    std::io::Write::flush(&mut std::io::stdout())?;
    Ok(())
}

fn print_help() {
    println!(
        "{}",
        [
            "VIEW [-a|-l|-al]",
            "READ <file>",
            "STREAM <file>",
            "CREATE <file>",
            "DELETE <file>",
            "INFO <file>",
            "WRITE <file> <sentence_num>",
            "UNDO <file>",
            "EXEC <file>",
            "LIST",
            "ADDACCESS -R|-W <file> <user>",
            "REMACCESS <file> <user>",
            "REQACCESS <file>",
            "VIEWREQS",
            "GRANTACCESS -R|-W <file> <user>",
            "CREATEFOLDER <dir>",
            "VIEWFOLDER [<path>]",
            "OPEN [-c] <dir>",
            "OPENPARENT",
            "MOVE <file> <dir>",
            "UPMOVE <file>",
            "CHECKPOINT <file> <tag>",
            "REVERT <file> <tag>",
            "VIEWCHECKPOINT <file> <tag>",
            "LISTCHECKPOINTS <file>",
            "help",
            "exit",
        ]
        .join("\n")
    );
}

async fn dispatch(
    ns: &mut TcpStream,
    username: &str,
    line: &str,
    stdin: &mut StdinLines,
) -> Result<()> {
    let mut parts = line.split_whitespace();
    let cmd = parts.next().unwrap_or("").to_ascii_uppercase();
    let rest: Vec<&str> = parts.collect();

    match cmd.as_str() {
        "VIEW" => cmd_view(ns, &rest).await,
        "READ" => cmd_read(ns, username, &rest).await,
        "STREAM" => cmd_stream(ns, username, &rest).await,
        "CREATE" => cmd_create(ns, username, &rest).await,
        "DELETE" => cmd_delete(ns, username, &rest).await,
        "INFO" => cmd_info(ns, username, &rest).await,
        "WRITE" => cmd_write(ns, username, &rest, stdin).await,
        "UNDO" => cmd_undo(ns, username, &rest).await,
        "EXEC" => cmd_exec(ns, username, &rest).await,
        "LIST" => cmd_list(ns).await,
        "ADDACCESS" => cmd_access(ns, username, &rest, MsgType::AccessAdd).await,
        "REMACCESS" => cmd_remaccess(ns, username, &rest).await,
        "REQACCESS" => cmd_reqaccess(ns, username, &rest).await,
        "VIEWREQS" => cmd_viewreqs(ns).await,
        "GRANTACCESS" => cmd_access(ns, username, &rest, MsgType::GrantReqAccess).await,
        "CREATEFOLDER" => {
            let dir = rest.first().ok_or_else(|| Error::BadCommand("usage: CREATEFOLDER <dir>".into()))?;
            folder_cmd(ns, "CREATEFOLDER", dir, "", false).await
        }
        "VIEWFOLDER" => {
            let path = rest.first().copied().unwrap_or("");
            folder_cmd(ns, "VIEWFOLDER", path, "", false).await
        }
        "OPEN" => cmd_open(ns, &rest).await,
        "OPENPARENT" => folder_cmd(ns, "OPENPARENT", "", "", false).await,
        "MOVE" => {
            if rest.len() != 2 {
                return Err(Error::BadCommand("usage: MOVE <file> <dir>".into()));
            }
            folder_cmd(ns, "MOVE", rest[0], rest[1], false).await
        }
        "UPMOVE" => {
            let file = rest.first().ok_or_else(|| Error::BadCommand("usage: UPMOVE <file>".into()))?;
            folder_cmd(ns, "UPMOVE", file, "", false).await
        }
        "CHECKPOINT" => cmd_checkpoint(ns, &rest).await,
        "REVERT" => cmd_revert(ns, &rest).await,
        "VIEWCHECKPOINT" => cmd_viewcheckpoint(ns, &rest).await,
        "LISTCHECKPOINTS" => cmd_listcheckpoints(ns, &rest).await,
        other => Err(Error::BadCommand(format!("unknown command '{other}'; type help"))),
    }
}

/// Sends one Client<->NS request and maps the reply to either the expected
/// success payload or a [`Error::Remote`]/[`Error::UnexpectedReply`].
async fn ns_call(
    ns: &mut TcpStream,
    msg_type: MsgType,
    payload: &[u8],
    expected: MsgType,
) -> Result<Vec<u8>> {
    write_message(ns, msg_type, payload).await?;
    let (reply_type, reply_payload) = read_message(ns, MAX_PAYLOAD).await?;
    if reply_type == expected {
        Ok(reply_payload)
    } else if reply_type == MsgType::GenericFail || reply_type == MsgType::LoginFail {
        Err(Error::Remote(ResError::decode(&reply_payload)?.msg))
    } else {
        Err(Error::UnexpectedReply(format!("{reply_type:?}")))
    }
}

/// Resolution request (READ/STREAM/WRITE/UNDO/CHECKPOINT): the NS answers
/// with `SS_LOC` and the client connects directly to that Storage Server.
async fn resolve(ns: &mut TcpStream, msg_type: MsgType, payload: &[u8]) -> Result<ResSsLocation> {
    write_message(ns, msg_type, payload).await?;
    let (reply_type, reply_payload) = read_message(ns, MAX_PAYLOAD).await?;
    match reply_type {
        MsgType::SsLoc => Ok(ResSsLocation::decode(&reply_payload)?),
        MsgType::GenericFail => Err(Error::Remote(ResError::decode(&reply_payload)?.msg)),
        other => Err(Error::UnexpectedReply(format!("{other:?}"))),
    }
}

async fn cmd_view(ns: &mut TcpStream, rest: &[&str]) -> Result<()> {
    let flags = rest.first().map(|f| ViewFlags::parse(f)).unwrap_or_default();
    let req = ReqView { flags };
    let payload = ns_call(ns, MsgType::View, &req.encode()?, MsgType::ViewRes).await?;
    println!("{}", TextBlob::decode(&payload)?.data);
    Ok(())
}

async fn cmd_create(ns: &mut TcpStream, username: &str, rest: &[&str]) -> Result<()> {
    let filename = rest.first().ok_or_else(|| Error::BadCommand("usage: CREATE <file>".into()))?;
    let req = ReqFileOp { username: username.to_string(), filename: filename.to_string() };
    let payload = ns_call(ns, MsgType::Create, &req.encode()?, MsgType::GenericOk).await?;
    println!("SUCCESS: {}", ResSuccess::decode(&payload)?.msg);
    Ok(())
}

async fn cmd_delete(ns: &mut TcpStream, username: &str, rest: &[&str]) -> Result<()> {
    let filename = rest.first().ok_or_else(|| Error::BadCommand("usage: DELETE <file>".into()))?;
    let req = ReqFileOp { username: username.to_string(), filename: filename.to_string() };
    let payload = ns_call(ns, MsgType::Delete, &req.encode()?, MsgType::GenericOk).await?;
    println!("SUCCESS: {}", ResSuccess::decode(&payload)?.msg);
    Ok(())
}

async fn cmd_info(ns: &mut TcpStream, username: &str, rest: &[&str]) -> Result<()> {
    let filename = rest.first().ok_or_else(|| Error::BadCommand("usage: INFO <file>".into()))?;
    let req = ReqFileOp { username: username.to_string(), filename: filename.to_string() };
    let payload = ns_call(ns, MsgType::Info, &req.encode()?, MsgType::InfoRes).await?;
    let meta = FileMetadata::decode(&payload)?;
    println!(
        "SUCCESS: {} owner={} size={}B words={} chars={} modified={} accessed={}",
        meta.filename, meta.owner, meta.size_bytes, meta.word_count, meta.char_count,
        meta.last_modified, meta.last_access
    );
    Ok(())
}

async fn cmd_read(ns: &mut TcpStream, username: &str, rest: &[&str]) -> Result<()> {
    let filename = rest.first().ok_or_else(|| Error::BadCommand("usage: READ <file>".into()))?;
    let req = ReqFileOp { username: username.to_string(), filename: filename.to_string() };
    let loc = resolve(ns, MsgType::ReadReq, &req.encode()?).await?;

    let mut ss = TcpStream::connect((loc.ip, loc.port)).await?;
    write_message(&mut ss, MsgType::Read, &req.encode()?).await?;
    let mut stdout = tokio::io::stdout();
    loop {
        let (reply_type, payload) = read_message(&mut ss, MAX_PAYLOAD).await?;
        match reply_type {
            MsgType::ReadContent => {
                let chunk = ResFileContent::decode(&payload)?;
                stdout.write_all(&chunk.data).await?;
                if chunk.is_final_chunk {
                    break;
                }
            }
            MsgType::SsGenericFail => return Err(Error::Remote(ResError::decode(&payload)?.msg)),
            other => return Err(Error::UnexpectedReply(format!("{other:?}"))),
        }
    }
    stdout.flush().await?;
    Ok(())
}

async fn cmd_stream(ns: &mut TcpStream, username: &str, rest: &[&str]) -> Result<()> {
    let filename = rest.first().ok_or_else(|| Error::BadCommand("usage: STREAM <file>".into()))?;
    let req = ReqFileOp { username: username.to_string(), filename: filename.to_string() };
    let loc = resolve(ns, MsgType::StreamReq, &req.encode()?).await?;

    let mut ss = TcpStream::connect((loc.ip, loc.port)).await?;
    write_message(&mut ss, MsgType::Stream, &req.encode()?).await?;
    loop {
        let (reply_type, payload) = read_message(&mut ss, MAX_PAYLOAD).await?;
        match reply_type {
            MsgType::StreamWord => {
                print!("{} ", ResStreamWord::decode(&payload)?.word);
                flush_stdout()?;
            }
            MsgType::StreamEnd => {
                println!();
                break;
            }
            MsgType::SsGenericFail => return Err(Error::Remote(ResError::decode(&payload)?.msg)),
            other => return Err(Error::UnexpectedReply(format!("{other:?}"))),
        }
    }
    Ok(())
}

async fn cmd_write(
    ns: &mut TcpStream,
    username: &str,
    rest: &[&str],
    stdin: &mut StdinLines,
) -> Result<()> {
    if rest.len() != 2 {
        return Err(Error::BadCommand("usage: WRITE <file> <sentence_num>".into()));
    }
    let filename = rest[0].to_string();
    let sentence_num: i32 =
        rest[1].parse().map_err(|_| Error::BadCommand("sentence_num must be an integer".into()))?;

    let resolve_req = ReqFileOp { username: username.to_string(), filename: filename.clone() };
    let loc = resolve(ns, MsgType::WriteReq, &resolve_req.encode()?).await?;

    let mut ss = TcpStream::connect((loc.ip, loc.port)).await?;
    let open_req = ReqWriteTransaction { filename: filename.clone(), sentence_num };
    write_message(&mut ss, MsgType::Write, &open_req.encode()?).await?;
    let (reply_type, payload) = read_message(&mut ss, MAX_PAYLOAD).await?;
    let ack = match reply_type {
        MsgType::WriteOk => ResWriteOk::decode(&payload)?,
        MsgType::WriteLocked => {
            return Err(Error::Remote("sentence is locked by another writer".to_string()))
        }
        MsgType::SsGenericFail => return Err(Error::Remote(ResError::decode(&payload)?.msg)),
        other => return Err(Error::UnexpectedReply(format!("{other:?}"))),
    };
    println!(
        "SUCCESS: transaction open, {} words; enter \"<word_index> <content>\" per line or ETIRW to commit",
        ack.num_words
    );

    loop {
        print!("w> ");
        flush_stdout()?;
        let line = match stdin.next_line().await? {
            Some(l) => l,
            None => return Ok(()),
        };
        let line = line.trim();

        if line == "ETIRW" {
            write_message(&mut ss, MsgType::WriteEtirw, &[]).await?;
            let (reply_type, payload) = read_message(&mut ss, MAX_PAYLOAD).await?;
            match reply_type {
                MsgType::SsGenericOk => println!("SUCCESS: {}", ResSuccess::decode(&payload)?.msg),
                MsgType::SsGenericFail => {
                    eprintln!("ERROR: {}", ResError::decode(&payload)?.msg)
                }
                other => eprintln!("ERROR: unexpected reply {other:?}"),
            }
            return Ok(());
        }

        let mut fields = line.splitn(2, ' ');
        let index_str = fields.next().unwrap_or("");
        let content = fields.next().unwrap_or("");
        let word_index: i32 = match index_str.parse() {
            Ok(v) => v,
            Err(_) => {
                eprintln!("ERROR: word index must be an integer");
                continue;
            }
        };

        let data = ReqWriteData { word_index, content: content.to_string() };
        write_message(&mut ss, MsgType::WriteData, &data.encode()?).await?;
        match read_message(&mut ss, MAX_PAYLOAD).await? {
            (MsgType::SsGenericOk, _) => println!("SUCCESS"),
            (MsgType::SsGenericFail, payload) => {
                eprintln!("ERROR: {}", ResError::decode(&payload)?.msg)
            }
            (other, _) => eprintln!("ERROR: unexpected reply {other:?}"),
        }
    }
}

async fn cmd_undo(ns: &mut TcpStream, username: &str, rest: &[&str]) -> Result<()> {
    let filename = rest.first().ok_or_else(|| Error::BadCommand("usage: UNDO <file>".into()))?;
    let req = ReqFileOp { username: username.to_string(), filename: filename.to_string() };
    let loc = resolve(ns, MsgType::UndoReq, &req.encode()?).await?;

    let mut ss = TcpStream::connect((loc.ip, loc.port)).await?;
    write_message(&mut ss, MsgType::Undo, &req.encode()?).await?;
    match read_message(&mut ss, MAX_PAYLOAD).await? {
        (MsgType::SsGenericOk, payload) => {
            println!("SUCCESS: {}", ResSuccess::decode(&payload)?.msg);
            Ok(())
        }
        (MsgType::SsGenericFail, payload) => Err(Error::Remote(ResError::decode(&payload)?.msg)),
        (other, _) => Err(Error::UnexpectedReply(format!("{other:?}"))),
    }
}

async fn cmd_exec(ns: &mut TcpStream, username: &str, rest: &[&str]) -> Result<()> {
    let filename = rest.first().ok_or_else(|| Error::BadCommand("usage: EXEC <file>".into()))?;
    let req = ReqFileOp { username: username.to_string(), filename: filename.to_string() };
    let payload = ns_call(ns, MsgType::ExecReq, &req.encode()?, MsgType::ExecRes).await?;
    println!("SUCCESS: {}", TextBlob::decode(&payload)?.data);
    Ok(())
}

async fn cmd_list(ns: &mut TcpStream) -> Result<()> {
    let payload = ns_call(ns, MsgType::ListUsers, &[], MsgType::ListUsersRes).await?;
    println!("{}", TextBlob::decode(&payload)?.data);
    Ok(())
}

async fn cmd_access(
    ns: &mut TcpStream,
    username: &str,
    rest: &[&str],
    msg_type: MsgType,
) -> Result<()> {
    if rest.len() != 3 {
        return Err(Error::BadCommand("usage: ADDACCESS|GRANTACCESS -R|-W <file> <user>".into()));
    }
    let perm_flag =
        PermFlag::from_cli_flag(rest[0]).ok_or_else(|| Error::BadCommand("flag must be -R or -W".into()))?;
    let req = ReqAccess {
        username: username.to_string(),
        filename: rest[1].to_string(),
        target_user: rest[2].to_string(),
        perm_flag,
    };
    let expected = if msg_type == MsgType::GrantReqAccess { MsgType::ReqAccessOk } else { MsgType::GenericOk };
    let payload = ns_call(ns, msg_type, &req.encode()?, expected).await?;
    println!("SUCCESS: {}", ResSuccess::decode(&payload)?.msg);
    Ok(())
}

async fn cmd_remaccess(ns: &mut TcpStream, username: &str, rest: &[&str]) -> Result<()> {
    if rest.len() != 2 {
        return Err(Error::BadCommand("usage: REMACCESS <file> <user>".into()));
    }
    let req = ReqAccess {
        username: username.to_string(),
        filename: rest[0].to_string(),
        target_user: rest[1].to_string(),
        perm_flag: PermFlag::Read,
    };
    let payload = ns_call(ns, MsgType::AccessRem, &req.encode()?, MsgType::GenericOk).await?;
    println!("SUCCESS: {}", ResSuccess::decode(&payload)?.msg);
    Ok(())
}

async fn cmd_reqaccess(ns: &mut TcpStream, username: &str, rest: &[&str]) -> Result<()> {
    let filename = rest.first().ok_or_else(|| Error::BadCommand("usage: REQACCESS <file>".into()))?;
    let req = ReqFileOp { username: username.to_string(), filename: filename.to_string() };
    let payload = ns_call(ns, MsgType::ReqAccess, &req.encode()?, MsgType::GenericOk).await?;
    println!("SUCCESS: {}", ResSuccess::decode(&payload)?.msg);
    Ok(())
}

async fn cmd_viewreqs(ns: &mut TcpStream) -> Result<()> {
    let payload = ns_call(ns, MsgType::ViewReqAccess, &[], MsgType::ViewReqAccessRes).await?;
    println!("{}", TextBlob::decode(&payload)?.data);
    Ok(())
}

async fn cmd_open(ns: &mut TcpStream, rest: &[&str]) -> Result<()> {
    let (create_if_missing, dir) = if rest.first() == Some(&"-c") {
        (true, rest.get(1))
    } else {
        (false, rest.first())
    };
    let dir = dir.ok_or_else(|| Error::BadCommand("usage: OPEN [-c] <dir>".into()))?;
    folder_cmd(ns, "OPEN", dir, "", create_if_missing).await
}

/// Shared driver for all `FOLDER_CMD` variants. The NS returns the same
/// `GENERIC_OK` wrapping either a plain acknowledgement or (for
/// VIEWFOLDER) a newline-joined listing; both decode identically since
/// [`TextBlob`] and [`ResSuccess`] share the same single fixed-string wire
/// shape.
async fn folder_cmd(
    ns: &mut TcpStream,
    command: &str,
    arg1: &str,
    arg2: &str,
    create_if_missing: bool,
) -> Result<()> {
    let req = ReqFolder {
        command: command.to_string(),
        arg1: arg1.to_string(),
        arg2: arg2.to_string(),
        create_if_missing,
    };
    let payload = ns_call(ns, MsgType::FolderCmd, &req.encode()?, MsgType::GenericOk).await?;
    let msg = TextBlob::decode(&payload)?.data;
    if msg.is_empty() {
        println!("SUCCESS");
    } else {
        println!("SUCCESS: {msg}");
    }
    Ok(())
}

async fn resolve_checkpoint(ns: &mut TcpStream, req: &ReqCheckpoint) -> Result<ResSsLocation> {
    resolve(ns, MsgType::CheckpointReq, &req.encode()?).await
}

async fn cmd_checkpoint(ns: &mut TcpStream, rest: &[&str]) -> Result<()> {
    if rest.len() != 2 {
        return Err(Error::BadCommand("usage: CHECKPOINT <file> <tag>".into()));
    }
    let req = ReqCheckpoint {
        command: CheckpointCommand::Checkpoint,
        filename: rest[0].to_string(),
        tag: rest[1].to_string(),
    };
    let loc = resolve_checkpoint(ns, &req).await?;
    let mut ss = TcpStream::connect((loc.ip, loc.port)).await?;
    write_message(&mut ss, MsgType::CheckpointOp, &req.encode()?).await?;
    match read_message(&mut ss, MAX_PAYLOAD).await? {
        (MsgType::AckOk, payload) => {
            println!("SUCCESS: {}", ResSuccess::decode(&payload)?.msg);
            Ok(())
        }
        (MsgType::AckFail, payload) => Err(Error::Remote(ResError::decode(&payload)?.msg)),
        (other, _) => Err(Error::UnexpectedReply(format!("{other:?}"))),
    }
}

async fn cmd_revert(ns: &mut TcpStream, rest: &[&str]) -> Result<()> {
    if rest.len() != 2 {
        return Err(Error::BadCommand("usage: REVERT <file> <tag>".into()));
    }
    let req = ReqCheckpoint {
        command: CheckpointCommand::Revert,
        filename: rest[0].to_string(),
        tag: rest[1].to_string(),
    };
    let loc = resolve_checkpoint(ns, &req).await?;
    let mut ss = TcpStream::connect((loc.ip, loc.port)).await?;
    write_message(&mut ss, MsgType::CheckpointOp, &req.encode()?).await?;
    match read_message(&mut ss, MAX_PAYLOAD).await? {
        (MsgType::SsGenericOk, payload) => {
            println!("SUCCESS: {}", ResSuccess::decode(&payload)?.msg);
            Ok(())
        }
        (MsgType::SsGenericFail, payload) => Err(Error::Remote(ResError::decode(&payload)?.msg)),
        (other, _) => Err(Error::UnexpectedReply(format!("{other:?}"))),
    }
}

async fn cmd_viewcheckpoint(ns: &mut TcpStream, rest: &[&str]) -> Result<()> {
    if rest.len() != 2 {
        return Err(Error::BadCommand("usage: VIEWCHECKPOINT <file> <tag>".into()));
    }
    let req = ReqCheckpoint {
        command: CheckpointCommand::ViewCheckpoint,
        filename: rest[0].to_string(),
        tag: rest[1].to_string(),
    };
    let loc = resolve_checkpoint(ns, &req).await?;
    let mut ss = TcpStream::connect((loc.ip, loc.port)).await?;
    write_message(&mut ss, MsgType::CheckpointOp, &req.encode()?).await?;
    match read_message(&mut ss, MAX_PAYLOAD).await? {
        (MsgType::ReadContent, payload) => {
            let chunk = ResFileContent::decode(&payload)?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&chunk.data).await?;
            stdout.flush().await?;
            Ok(())
        }
        (MsgType::SsGenericFail, payload) => Err(Error::Remote(ResError::decode(&payload)?.msg)),
        (other, _) => Err(Error::UnexpectedReply(format!("{other:?}"))),
    }
}

async fn cmd_listcheckpoints(ns: &mut TcpStream, rest: &[&str]) -> Result<()> {
    let filename =
        rest.first().ok_or_else(|| Error::BadCommand("usage: LISTCHECKPOINTS <file>".into()))?;
    let req = ReqCheckpoint {
        command: CheckpointCommand::ListCheckpoints,
        filename: filename.to_string(),
        tag: String::new(),
    };
    let loc = resolve_checkpoint(ns, &req).await?;
    let mut ss = TcpStream::connect((loc.ip, loc.port)).await?;
    write_message(&mut ss, MsgType::CheckpointOp, &req.encode()?).await?;
    match read_message(&mut ss, MAX_PAYLOAD).await? {
        (MsgType::GenericOk, payload) => {
            println!("{}", TextBlob::decode(&payload)?.data);
            Ok(())
        }
        (MsgType::SsGenericFail, payload) => Err(Error::Remote(ResError::decode(&payload)?.msg)),
        (other, _) => Err(Error::UnexpectedReply(format!("{other:?}"))),
    }
}

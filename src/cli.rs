use crate::{
    api::LibraryApi,
    config::Config,
    pages::{
        catalog::{ActionOutcome, CatalogPage},
        readers::ReadersPage,
        records::{RecordsPage, ReturnOutcome, SubmitOutcome},
        returns::ReturnDesk,
    },
    routes::{self, Navigation, Page},
    session::Session,
    transcript::Transcript,
    Args,
};
use anyhow::Result;
use chrono::Utc;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::cell::RefCell;

pub struct Context {
    pub args: Args,
    pub config: Config,
    pub api: Box<dyn LibraryApi>,
    pub session_id: String,
    pub transcript: RefCell<Transcript>,
    pub session: RefCell<Session>,
    pub current_page: RefCell<Page>,
    pub catalog: RefCell<CatalogPage>,
    pub records: RefCell<RecordsPage>,
    pub returns: RefCell<ReturnDesk>,
    pub readers: RefCell<ReadersPage>,
}

fn verbose(ctx: &Context, message: &str) {
    if ctx.args.verbose {
        eprintln!("[VERBOSE] {}", message);
    }
}

/// All API failures land here: report, log, move on with state unchanged.
fn report_api_error(ctx: &Context, operation: &str, err: &anyhow::Error) {
    eprintln!("{} failed: {}", operation, err);
    let _ = ctx
        .transcript
        .borrow_mut()
        .api_error(operation, &err.to_string());
}

pub fn run_once(ctx: &Context, script: &str) -> Result<()> {
    for command in script.split(';') {
        let command = command.trim();
        if command.is_empty() {
            continue;
        }
        if dispatch(ctx, command) {
            break;
        }
    }
    Ok(())
}

pub fn run_repl(ctx: Context) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    println!("biblio - type help for commands, exit to quit");
    visit(&ctx, "home");

    loop {
        let prompt = format!("{}> ", ctx.current_page.borrow().path());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;
                if dispatch(&ctx, line) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Handle one command line. Returns true when the session should end.
fn dispatch(ctx: &Context, line: &str) -> bool {
    let words = match shell_words::split(line) {
        Ok(words) => words,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            return false;
        }
    };
    let (command, rest) = match words.split_first() {
        Some(split) => split,
        None => return false,
    };

    match command.as_str() {
        "exit" | "quit" => return true,
        "help" => print_help(),
        "session" => {
            println!("Session: {}", ctx.session_id);
            println!("Transcript: {:?}", ctx.transcript.borrow().path);
            match ctx.session.borrow().user() {
                Some(user) => println!("Signed in as {} ({})", user.username, user.role.as_str()),
                None => println!("Not signed in"),
            }
        }
        "login" if !rest.is_empty() => handle_login(ctx, rest),
        "logout" => handle_logout(ctx),
        "home" | "login" | "catalog" | "records" | "returns" | "readers" => {
            visit(ctx, command);
        }
        "add" => handle_add(ctx, rest),
        "return" => handle_return(ctx, rest),
        "borrow" => handle_borrow(ctx, rest, false),
        "checkin" => handle_borrow(ctx, rest, true),
        "reload" => handle_reload(ctx),
        _ => println!("Unknown command: {}. Type help.", command),
    }
    false
}

fn print_help() {
    println!("Pages:");
    for route in routes::ROUTES {
        let guard = if route.requires_auth {
            " (login required)"
        } else {
            ""
        };
        println!("  {:<10} - {}{}", route.path, route.page.title(), guard);
    }
    println!("Commands:");
    println!("  login <username> <password>");
    println!("  logout");
    println!("  borrow <book-id>                  - catalog page");
    println!("  checkin <book-id>                 - catalog page");
    println!("  add <book-id> <title> <borrower>  - records page");
    println!("  return <id>                       - records or returns page");
    println!("  reload                            - refetch the current page");
    println!("  session / help / exit");
}

fn visit(ctx: &Context, path: &str) {
    let authenticated = ctx.session.borrow().is_authenticated();
    match routes::navigate(path, authenticated) {
        Navigation::Allowed(page) => {
            let _ = ctx.transcript.borrow_mut().page_visit(path);
            *ctx.current_page.borrow_mut() = page;
            render_page(ctx, page);
        }
        Navigation::LoginRequired => {
            println!("Login required. Use: login <username> <password>");
            let _ = ctx.transcript.borrow_mut().guard_denied(path);
        }
        Navigation::NotFound => println!("Unknown page: {}", path),
    }
}

fn render_page(ctx: &Context, page: Page) {
    match page {
        Page::Home => {
            println!("Library client ({})", ctx.config.api.base_url);
            println!("Pages:");
            for route in routes::ROUTES {
                let guard = if route.requires_auth {
                    " (login required)"
                } else {
                    ""
                };
                println!("  {:<10} {}{}", route.path, route.page.title(), guard);
            }
        }
        Page::Login => match ctx.session.borrow().user() {
            Some(user) => println!(
                "Signed in as {} ({}). Use logout to sign out.",
                user.username,
                user.role.as_str()
            ),
            None => println!("Usage: login <username> <password>"),
        },
        Page::Catalog => {
            let mut catalog = ctx.catalog.borrow_mut();
            verbose(ctx, "GET /books");
            if let Err(e) = catalog.ensure_loaded(ctx.api.as_ref()) {
                report_api_error(ctx, "listBooks", &e);
                return;
            }
            catalog.render();
        }
        Page::Records => {
            let mut records = ctx.records.borrow_mut();
            verbose(ctx, "GET /borrow-records");
            if let Err(e) = records.ensure_loaded(ctx.api.as_ref()) {
                report_api_error(ctx, "listBorrowRecords", &e);
                return;
            }
            records.render();
        }
        Page::Returns => ctx.returns.borrow_mut().render(Utc::now()),
        Page::Readers => {
            let mut readers = ctx.readers.borrow_mut();
            verbose(ctx, "GET /borrow-records");
            if let Err(e) = readers.load(ctx.api.as_ref()) {
                report_api_error(ctx, "listBorrowRecords", &e);
                return;
            }
            readers.render();
        }
    }
}

fn handle_login(ctx: &Context, rest: &[String]) {
    if rest.len() != 2 {
        println!("Usage: login <username> <password>");
        return;
    }
    let (username, password) = (&rest[0], &rest[1]);
    let mut session = ctx.session.borrow_mut();
    match session.login(ctx.api.as_ref(), username, password) {
        Ok(user) => {
            println!("Signed in as {} ({})", user.username, user.role.as_str());
            let role = user.role.as_str();
            let name = user.username.clone();
            let _ = ctx.transcript.borrow_mut().login_ok(&name, role);
        }
        Err(e) => {
            println!("Login failed: {}", e);
            let _ = ctx.transcript.borrow_mut().login_failed(username);
        }
    }
}

fn handle_logout(ctx: &Context) {
    let mut session = ctx.session.borrow_mut();
    match session.logout(ctx.api.as_ref()) {
        Ok(Some(user)) => {
            println!("Signed out {}", user.username);
            let _ = ctx.transcript.borrow_mut().logout(&user.username);
        }
        Ok(None) => println!("Not signed in"),
        // The local session is already cleared; the server call failed.
        Err(e) => report_api_error(ctx, "logout", &e),
    }
    // Guarded pages are gone; drop back to home.
    *ctx.current_page.borrow_mut() = Page::Home;
}

fn handle_add(ctx: &Context, rest: &[String]) {
    if *ctx.current_page.borrow() != Page::Records {
        println!("Open the records page first (type: records)");
        return;
    }
    if rest.len() != 3 {
        println!("Usage: add <book-id> <title> <borrower>");
        return;
    }
    let mut records = ctx.records.borrow_mut();
    records.set_draft(&rest[0], &rest[1], &rest[2]);
    verbose(ctx, "POST /borrow-records");
    match records.submit(ctx.api.as_ref()) {
        Ok(SubmitOutcome::Created(id)) => {
            println!("Created borrow record #{}", id);
            let record = records.records()[0].clone();
            let _ = ctx.transcript.borrow_mut().record_created(
                record.id,
                record.book_id,
                &record.borrower_name,
            );
            records.render();
        }
        Ok(SubmitOutcome::MissingFields) => {
            println!("Book id, title and borrower are all required");
        }
        Ok(SubmitOutcome::InvalidBookId) => {
            println!("Book id must be a number, got '{}'", rest[0]);
        }
        Err(e) => report_api_error(ctx, "createBorrowRecord", &e),
    }
}

fn handle_return(ctx: &Context, rest: &[String]) {
    let id = match parse_id(rest) {
        Some(id) => id,
        None => {
            println!("Usage: return <id>");
            return;
        }
    };
    let page = *ctx.current_page.borrow();
    match page {
        Page::Records => {
            let mut records = ctx.records.borrow_mut();
            verbose(ctx, "PATCH /borrow-records/{id}");
            match records.mark_returned(ctx.api.as_ref(), id) {
                Ok(ReturnOutcome::Returned) => {
                    println!("Record #{} marked returned", id);
                    let _ = ctx.transcript.borrow_mut().record_returned(id);
                    records.render();
                }
                Ok(ReturnOutcome::AlreadyReturned) => {
                    println!("Record #{} is already returned", id)
                }
                Ok(ReturnOutcome::NotFound) => println!("No record #{} on this page", id),
                Err(e) => report_api_error(ctx, "updateBorrowRecord", &e),
            }
        }
        Page::Returns => {
            let now = Utc::now();
            let mut returns = ctx.returns.borrow_mut();
            if returns.return_loan(id, now) {
                let overdue = returns.returned()[0].overdue;
                let _ = ctx.transcript.borrow_mut().loan_returned(id, overdue);
                returns.render(now);
            } else {
                println!("No book #{} waiting to be returned", id);
            }
        }
        _ => println!("Open the records or returns page first"),
    }
}

fn handle_borrow(ctx: &Context, rest: &[String], check_in: bool) {
    if *ctx.current_page.borrow() != Page::Catalog {
        println!("Open the catalog first (type: catalog)");
        return;
    }
    let id = match parse_id(rest) {
        Some(id) => id,
        None => {
            println!("Usage: {} <book-id>", if check_in { "checkin" } else { "borrow" });
            return;
        }
    };
    let mut catalog = ctx.catalog.borrow_mut();
    let (label, result) = if check_in {
        verbose(ctx, "POST /books/{id}/return");
        ("returnBook", catalog.check_in(ctx.api.as_ref(), id))
    } else {
        verbose(ctx, "POST /books/{id}/borrow");
        ("borrowBook", catalog.borrow(ctx.api.as_ref(), id))
    };
    match result {
        Ok(outcome) => {
            let success = outcome == ActionOutcome::Ok;
            let _ = if check_in {
                ctx.transcript.borrow_mut().book_checked_in(id, success)
            } else {
                ctx.transcript.borrow_mut().book_borrowed(id, success)
            };
            if success {
                println!("Book #{} {}", id, if check_in { "checked in" } else { "borrowed" });
            } else {
                println!("The server refused the request for book #{}", id);
            }
        }
        Err(e) => report_api_error(ctx, label, &e),
    }
}

fn handle_reload(ctx: &Context) {
    let page = *ctx.current_page.borrow();
    match page {
        Page::Catalog => {
            let mut catalog = ctx.catalog.borrow_mut();
            match catalog.load(ctx.api.as_ref()) {
                Ok(()) => catalog.render(),
                Err(e) => report_api_error(ctx, "listBooks", &e),
            }
        }
        Page::Records => {
            let mut records = ctx.records.borrow_mut();
            match records.load(ctx.api.as_ref()) {
                Ok(()) => records.render(),
                Err(e) => report_api_error(ctx, "listBorrowRecords", &e),
            }
        }
        Page::Readers => render_page(ctx, Page::Readers),
        _ => println!("Nothing to reload here"),
    }
}

fn parse_id(rest: &[String]) -> Option<u64> {
    if rest.len() != 1 {
        return None;
    }
    rest[0].parse().ok()
}

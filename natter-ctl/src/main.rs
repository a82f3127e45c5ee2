use std::path::PathBuf;

use anyhow::Context;
use natter_client::{
    api::{AuthorId, CommentId, LoginRequest, NewComment, PostId},
    normalize_author, time_ago_now, CommentStore, FileSlot, SnapshotSlot, SortMode, TreeNode,
    DEFAULT_KEY,
};

mod http;
mod session;

use http::HttpApi;
use session::SavedSession;

#[derive(structopt::StructOpt)]
struct Opt {
    /// Base URL of the comment service
    #[structopt(short, long, env = "NATTER_HOST")]
    host: Option<String>,

    /// Where the session and the comment snapshot are kept
    #[structopt(long, env = "NATTER_STATE_DIR", default_value = ".natter", parse(from_os_str))]
    state_dir: PathBuf,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Log in and remember the session
    Login {
        #[structopt(long)]
        email: String,

        /// Display name, for first logins
        #[structopt(long)]
        name: Option<String>,
    },

    /// Forget the saved session
    Logout,

    /// Show the comment thread of a post
    Show {
        post: String,

        /// top, new or mostReplies; remembered for later runs
        #[structopt(long)]
        sort: Option<SortMode>,
    },

    /// Comment on a post, or reply to one of its comments
    Reply {
        post: String,

        #[structopt(long)]
        parent: Option<String>,

        text: String,
    },

    /// Toggle your upvote on a comment
    Upvote { post: String, comment: String },

    /// Set the sort mode used by `show`
    Sort { mode: SortMode },
}

type Store = CommentStore<HttpApi, Option<natter_client::api::Author>>;

struct Ctx {
    host: Option<String>,
    state_dir: PathBuf,
    saved: Option<SavedSession>,
}

impl Ctx {
    fn host(&self) -> anyhow::Result<&str> {
        self.host
            .as_deref()
            .context("no comment service configured, pass --host or set NATTER_HOST")
    }

    fn slot(&self) -> FileSlot {
        FileSlot::in_dir(&self.state_dir, DEFAULT_KEY)
    }

    fn store(&self) -> anyhow::Result<Store> {
        let api = HttpApi::new(self.host()?, session::token(self.saved.as_ref()));
        let author = self.saved.as_ref().map(|s| s.author.clone());
        Ok(CommentStore::load(api, author, self.slot()))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opt = <Opt as structopt::StructOpt>::from_args();
    std::fs::create_dir_all(&opt.state_dir)
        .with_context(|| format!("creating state directory {:?}", opt.state_dir))?;
    let ctx = Ctx {
        saved: session::load(&opt.state_dir)?,
        host: opt.host,
        state_dir: opt.state_dir,
    };

    match opt.cmd {
        Command::Login { email, name } => login(&ctx, email, name).await,
        Command::Logout => {
            match session::clear(&ctx.state_dir)? {
                true => println!("Logged out"),
                false => println!("Not logged in"),
            }
            Ok(())
        }
        Command::Show { post, sort } => {
            let store = ctx.store()?;
            if let Some(sort) = sort {
                store.set_sort(sort);
            }
            fetch(&store, &PostId(post)).await?;
            print_tree(&store);
            Ok(())
        }
        Command::Reply { post, parent, text } => {
            let store = ctx.store()?;
            let post = PostId(post);
            fetch(&store, &post).await?;
            let id = store
                .add(NewComment {
                    post_id: post,
                    parent_id: parent.map(CommentId),
                    text,
                })
                .await;
            report(&store);
            println!("Posted comment {}", id?);
            Ok(())
        }
        Command::Upvote { post, comment } => {
            let store = ctx.store()?;
            fetch(&store, &PostId(post)).await?;
            let id = CommentId(comment);
            let res = store.upvote(&id).await;
            report(&store);
            res?;
            match store.has_upvoted(&id) {
                true => println!("Upvoted {id}"),
                false => println!("Removed upvote on {id}"),
            }
            Ok(())
        }
        Command::Sort { mode } => set_sort(&ctx.slot(), mode),
    }
}

async fn login(ctx: &Ctx, email: String, name: Option<String>) -> anyhow::Result<()> {
    let api = HttpApi::new(ctx.host()?, None);
    let resp = api
        .login(&LoginRequest { email, name })
        .await
        .context("logging in")?;
    let author = normalize_author(resp.user, &AuthorId::unknown());
    println!("Logged in as {} ({})", author.name, author.id);
    session::save(
        &ctx.state_dir,
        &SavedSession {
            token: resp.token,
            author,
        },
    )
}

async fn fetch(store: &Store, post: &PostId) -> anyhow::Result<()> {
    let res = store.fetch_for_post(post).await;
    report(store);
    res.with_context(|| format!("loading the comments of post {post}"))
}

fn set_sort(slot: &impl SnapshotSlot, mode: SortMode) -> anyhow::Result<()> {
    let mut snapshot = slot.read().context("reading comment snapshot")?.unwrap_or_default();
    snapshot.sort_mode = mode;
    slot.write(&snapshot).context("writing comment snapshot")?;
    println!("Sorting by {}", mode.label());
    Ok(())
}

fn report(store: &Store) {
    for notice in store.take_notices() {
        eprintln!("{}: {}", notice.message, notice.error);
    }
}

fn print_tree(store: &Store) {
    let tree = store.tree();
    let total = tree.iter().map(TreeNode::subtree_len).sum::<usize>();
    println!("{total} comments, by {}", store.sort_mode().label());
    TreeNode::walk(&tree, &mut |depth, node| {
        let c = &node.comment;
        let indent = "    ".repeat(depth);
        let marker = match store.has_upvoted(&c.id) {
            true => '▲',
            false => '△',
        };
        let name = c.author.as_ref().map_or("Unknown", |a| a.name.as_str());
        println!(
            "{indent}{marker} {} · {name} · {} · {}",
            c.upvote_count,
            time_ago_now(c.created_at),
            c.id
        );
        for line in c.text.lines() {
            println!("{indent}  {line}");
        }
    });
}

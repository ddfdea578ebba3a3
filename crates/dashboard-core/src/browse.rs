//! Listing, searching, and detail views over users and posts.

use std::fmt;
use std::str::FromStr;

use crate::api::{ApiClient, ApiError, Comment, Post, User};

/// Which collection is being browsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Users,
    Posts,
}

impl ContentType {
    /// Plural name (`users` / `posts`).
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Users => "users",
            ContentType::Posts => "posts",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "users" | "user" => Ok(ContentType::Users),
            "posts" | "post" => Ok(ContentType::Posts),
            other => Err(format!("Unknown content type '{other}' (expected users or posts)")),
        }
    }
}

/// One record of either collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    User(User),
    Post(Post),
}

impl Item {
    pub fn id(&self) -> u64 {
        match self {
            Item::User(user) => user.id,
            Item::Post(post) => post.id,
        }
    }

    /// Case-insensitive substring match. `needle` must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        let hit = |s: &str| s.to_lowercase().contains(needle);
        match self {
            Item::User(user) => hit(&user.name) || hit(&user.username) || hit(&user.email),
            Item::Post(post) => hit(&post.title) || hit(&post.body),
        }
    }
}

/// A loaded collection plus the current search filter.
#[derive(Debug, Clone)]
pub struct Listing {
    kind: ContentType,
    items: Vec<Item>,
    filtered: Vec<usize>,
}

impl Listing {
    /// Wraps already-fetched items; everything is visible initially.
    pub fn new(kind: ContentType, items: Vec<Item>) -> Self {
        let filtered = (0..items.len()).collect();
        Self {
            kind,
            items,
            filtered,
        }
    }

    /// Fetches the whole collection for `kind`.
    ///
    /// # Errors
    /// Returns the remote error; callers show it inline.
    pub async fn load(client: &ApiClient, kind: ContentType) -> Result<Self, ApiError> {
        let items: Vec<Item> = match kind {
            ContentType::Users => client.users().await?.into_iter().map(Item::User).collect(),
            ContentType::Posts => client.posts().await?.into_iter().map(Item::Post).collect(),
        };
        tracing::info!(kind = %kind, count = items.len(), "listing loaded");
        Ok(Self::new(kind, items))
    }

    pub fn kind(&self) -> ContentType {
        self.kind
    }

    /// Applies a search term. Blank terms show everything.
    ///
    /// Users match on name, username or email; posts on title or body.
    pub fn search(&mut self, term: &str) {
        let needle = term.trim().to_lowercase();
        self.filtered = if needle.is_empty() {
            (0..self.items.len()).collect()
        } else {
            self.items
                .iter()
                .enumerate()
                .filter(|(_, item)| item.matches(&needle))
                .map(|(i, _)| i)
                .collect()
        };
        tracing::debug!(term, matches = self.filtered.len(), "search applied");
    }

    pub fn visible(&self) -> impl Iterator<Item = &Item> {
        self.filtered.iter().map(|&i| &self.items[i])
    }

    pub fn visible_count(&self) -> usize {
        self.filtered.len()
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// "Showing N of M users".
    pub fn summary(&self) -> String {
        format!(
            "Showing {} of {} {}",
            self.visible_count(),
            self.total(),
            self.kind
        )
    }
}

/// Data shown alongside a detail record.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    UserPosts(Vec<Post>),
    PostComments(Vec<Comment>),
}

impl Related {
    pub fn len(&self) -> usize {
        match self {
            Related::UserPosts(posts) => posts.len(),
            Related::PostComments(comments) => comments.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single record with its related collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Detail {
    pub item: Item,
    pub related: Related,
}

impl Detail {
    /// Loads the record, then its related data.
    ///
    /// Failing to load the related data is logged and yields an empty list;
    /// only a failure to load the record itself is an error.
    ///
    /// # Errors
    /// Returns the remote error for the main record.
    pub async fn load(client: &ApiClient, kind: ContentType, id: u64) -> Result<Self, ApiError> {
        match kind {
            ContentType::Users => {
                let user = client.user(id).await?;
                let posts = client.posts_by_user(id).await.unwrap_or_else(|err| {
                    tracing::warn!(user_id = id, error = %err, "failed to load user posts");
                    Vec::new()
                });
                Ok(Self {
                    item: Item::User(user),
                    related: Related::UserPosts(posts),
                })
            }
            ContentType::Posts => {
                let post = client.post(id).await?;
                let comments = client.comments_by_post(id).await.unwrap_or_else(|err| {
                    tracing::warn!(post_id = id, error = %err, "failed to load comments");
                    Vec::new()
                });
                Ok(Self {
                    item: Item::Post(post),
                    related: Related::PostComments(comments),
                })
            }
        }
    }
}

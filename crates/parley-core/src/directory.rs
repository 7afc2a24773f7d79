//! Read-only user directory for authenticated callers.

use parley_types::error::ChatError;
use parley_types::user::{User, UserId};

use crate::conversation::storage_failure;
use crate::pagination::{Page, PageWindow, paginate};
use crate::repository::user::UserRepository;

pub struct UserDirectory<U: UserRepository> {
    users: U,
    per_page: u32,
}

impl<U: UserRepository> UserDirectory<U> {
    pub fn new(users: U, per_page: u32) -> Self {
        Self { users, per_page }
    }

    /// All users, oldest account first.
    pub async fn list_users(&self, page: i64) -> Result<Page<User>, ChatError> {
        let window = PageWindow::new(page, self.per_page);
        let total = self.users.count().await.map_err(storage_failure)?;
        paginate(window, total, |limit, offset| async move {
            self.users.list(limit, offset).await.map_err(storage_failure)
        })
        .await
    }

    pub async fn get_user(&self, id: &UserId) -> Result<User, ChatError> {
        self.users
            .get_by_id(id)
            .await
            .map_err(storage_failure)?
            .ok_or_else(|| ChatError::NotFound(format!("no user was found with id {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryStore;

    #[tokio::test]
    async fn test_list_users_pages() {
        let store = InMemoryStore::new();
        for name in ["a", "b", "c"] {
            store.add_user(name);
        }
        let directory = UserDirectory::new(store, 2);

        let first = directory.list_users(1).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.pages, 2);
        assert!(first.has_next);

        let second = directory.list_users(2).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].username, "c");
    }

    #[tokio::test]
    async fn test_get_user() {
        let store = InMemoryStore::new();
        let ada = store.add_user("ada");
        let directory = UserDirectory::new(store, 20);

        assert_eq!(directory.get_user(&ada.id).await.unwrap(), ada);
        assert!(matches!(
            directory.get_user(&UserId::new()).await,
            Err(ChatError::NotFound(_))
        ));
    }
}

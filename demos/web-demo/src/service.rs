use maya_web::prelude::*;
use parking_lot::RwLock;

use crate::models::{CreateUserRequest, UpdateUserRequest, User};

/// 内存中的用户存储
pub struct UserService {
    users: RwLock<Vec<User>>,
}

impl Injectable for UserService {
    fn inject(_: &Injector) -> ContainerResult<Self> {
        tracing::info!("UserService created");
        Ok(UserService {
            users: RwLock::new(vec![
                User {
                    id: 1,
                    name: "Alice".to_string(),
                    email: "alice@example.com".to_string(),
                    address: None,
                    birthday: Some("1990-04-12".to_string()),
                    active: true,
                },
                User {
                    id: 2,
                    name: "Bob".to_string(),
                    email: "bob@example.com".to_string(),
                    address: Some("221B Baker Street".to_string()),
                    birthday: None,
                    active: true,
                },
            ]),
        })
    }
}

impl UserService {
    pub fn list_users(&self) -> Vec<User> {
        self.users.read().clone()
    }

    pub fn get_user(&self, id: u32) -> Option<User> {
        self.users.read().iter().find(|u| u.id == id).cloned()
    }

    pub fn create_user(&self, request: CreateUserRequest) -> User {
        let mut users = self.users.write();
        let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        let user = User {
            id,
            name: request.name,
            email: request.email,
            address: request.address,
            birthday: request.birthday,
            active: true,
        };
        users.push(user.clone());
        user
    }

    pub fn update_user(&self, id: u32, request: UpdateUserRequest) -> Option<User> {
        let mut users = self.users.write();
        let user = users.iter_mut().find(|u| u.id == id)?;
        if let Some(name) = request.name {
            user.name = name;
        }
        if let Some(active) = request.active {
            user.active = active;
        }
        Some(user.clone())
    }

    pub fn delete_user(&self, id: u32) -> bool {
        let mut users = self.users.write();
        let before = users.len();
        users.retain(|u| u.id != id);
        users.len() != before
    }
}

//! Blog business rules expressed as specifications.

use crate::post::Post;
use crate::specification::Specification;
use crate::user::User;

/// The user holds the author role.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserCanCreatePost;

impl Specification<User> for UserCanCreatePost {
    fn is_satisfied_by(&self, user: &User) -> bool {
        user.can_create_post()
    }

    fn describe(&self) -> String {
        "user can create posts".to_string()
    }
}

/// The user holds the commenter role.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserCanComment;

impl Specification<User> for UserCanComment {
    fn is_satisfied_by(&self, user: &User) -> bool {
        user.can_comment()
    }

    fn describe(&self) -> String {
        "user can comment".to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UserIsAdmin;

impl Specification<User> for UserIsAdmin {
    fn is_satisfied_by(&self, user: &User) -> bool {
        user.is_admin()
    }

    fn describe(&self) -> String {
        "user is admin".to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostIsArchived;

impl Specification<Post> for PostIsArchived {
    fn is_satisfied_by(&self, post: &Post) -> bool {
        post.is_archived()
    }

    fn describe(&self) -> String {
        "post is archived".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specification::SpecificationExt;
    use crate::user::UserRole;
    use common::AggregateId;

    fn user(roles: &[UserRole]) -> User {
        User::new("u@example.com", "u", "hash", "", roles.iter().copied()).unwrap()
    }

    #[test]
    fn role_rules() {
        let author = user(&[UserRole::Author]);
        let admin = user(&[UserRole::Admin, UserRole::Commenter]);

        assert!(UserCanCreatePost.is_satisfied_by(&author));
        assert!(!UserCanComment.is_satisfied_by(&author));
        assert!(UserIsAdmin.is_satisfied_by(&admin));
        assert!(UserCanComment.is_satisfied_by(&admin));
    }

    #[test]
    fn moderator_rule_composes() {
        let moderator = UserIsAdmin.or(UserCanCreatePost.and(UserCanComment));

        assert_eq!(
            moderator.describe(),
            "(user is admin OR (user can create posts AND user can comment))"
        );
        assert!(moderator.is_satisfied_by(&user(&[UserRole::Admin])));
        assert!(moderator.is_satisfied_by(&user(&[UserRole::Author, UserRole::Commenter])));
        assert!(!moderator.is_satisfied_by(&user(&[UserRole::Author])));
    }

    #[test]
    fn and_agrees_with_boolean_and_over_every_role_set() {
        let role_sets: [&[UserRole]; 5] = [
            &[UserRole::Author],
            &[UserRole::Commenter],
            &[UserRole::Admin],
            &[UserRole::Author, UserRole::Commenter],
            &[UserRole::Author, UserRole::Commenter, UserRole::Admin],
        ];
        let both = UserCanCreatePost.and(UserCanComment);

        for roles in role_sets {
            let candidate = user(roles);
            assert_eq!(
                both.is_satisfied_by(&candidate),
                UserCanCreatePost.is_satisfied_by(&candidate)
                    && UserCanComment.is_satisfied_by(&candidate)
            );
        }
    }

    #[test]
    fn archived_post_rule() {
        let mut post = Post::new(AggregateId::new("u-1"), "T", "C").unwrap();
        let editable = PostIsArchived.not();

        assert!(editable.is_satisfied_by(&post));
        post.archive().unwrap();
        assert!(PostIsArchived.is_satisfied_by(&post));
        assert_eq!(editable.describe(), "NOT post is archived");
    }
}

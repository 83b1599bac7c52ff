//! Role gate: which screens and buttons to offer for a role.
//!
//! This is cosmetic. It decides what the shell shows and where it
//! redirects; it is not a security boundary. The server enforces every
//! permission on its own and must be tested for that independently.

use std::fmt;

use crate::session::{Role, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Login,
    Register,
    Dashboard,
    Products,
    StockIn,
    StockOut,
    Categories,
    Users,
    Reports,
    Profile,
}

/// Who may see a screen or use an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Access {
    Public,
    Authenticated,
    Admin,
}

/// In-page affordance on a list screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create(Screen),
    Edit(Screen),
    Delete(Screen),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Screen(Screen),
    Action(Action),
}

impl From<Screen> for Target {
    fn from(screen: Screen) -> Self {
        Target::Screen(screen)
    }
}

impl From<Action> for Target {
    fn from(action: Action) -> Self {
        Target::Action(action)
    }
}

/// Where an authenticated user lands when a screen is denied.
pub const HOME: Screen = Screen::Dashboard;

/// Sidebar order.
const MENU: [Screen; 8] = [
    Screen::Dashboard,
    Screen::Products,
    Screen::StockIn,
    Screen::StockOut,
    Screen::Categories,
    Screen::Reports,
    Screen::Users,
    Screen::Profile,
];

impl Screen {
    pub fn access(&self) -> Access {
        match self {
            Screen::Login | Screen::Register => Access::Public,
            Screen::Dashboard | Screen::Products | Screen::Reports | Screen::Profile => {
                Access::Authenticated
            }
            Screen::StockIn | Screen::StockOut | Screen::Categories | Screen::Users => Access::Admin,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Screen::Login => "login",
            Screen::Register => "register",
            Screen::Dashboard => "dashboard",
            Screen::Products => "products",
            Screen::StockIn => "stock-in",
            Screen::StockOut => "stock-out",
            Screen::Categories => "categories",
            Screen::Users => "users",
            Screen::Reports => "reports",
            Screen::Profile => "profile",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Login => "Login",
            Screen::Register => "Register",
            Screen::Dashboard => "Dashboard",
            Screen::Products => "Products",
            Screen::StockIn => "Stock In",
            Screen::StockOut => "Stock Out",
            Screen::Categories => "Categories",
            Screen::Users => "User Management",
            Screen::Reports => "Reports",
            Screen::Profile => "Profile",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Action {
    pub fn screen(&self) -> Screen {
        match self {
            Action::Create(screen) | Action::Edit(screen) | Action::Delete(screen) => *screen,
        }
    }

    /// Writes on every managed list are admin-only, including products,
    /// whose list itself is open to all signed-in users.
    pub fn access(&self) -> Access {
        match self.screen() {
            Screen::Products | Screen::StockIn | Screen::StockOut | Screen::Categories | Screen::Users => {
                Access::Admin
            }
            other => other.access(),
        }
    }
}

impl Target {
    pub fn access(&self) -> Access {
        match self {
            Target::Screen(screen) => screen.access(),
            Target::Action(action) => action.access(),
        }
    }
}

fn granted(access: Access, role: Option<Role>) -> bool {
    match access {
        Access::Public => true,
        Access::Authenticated => role.is_some(),
        Access::Admin => role == Some(Role::Admin),
    }
}

/// `role` is `None` when nobody is signed in.
pub fn can_see(target: impl Into<Target>, role: Option<Role>) -> bool {
    granted(target.into().access(), role)
}

/// Screen to actually show when `requested` is asked for.
///
/// Without a token every protected screen goes to the login screen. A
/// signed-in user denied a screen goes to the dashboard.
pub fn resolve(requested: Screen, session: &Session) -> Screen {
    if requested.access() == Access::Public {
        return requested;
    }
    if !session.is_authenticated() {
        return Screen::Login;
    }
    // A token with no stored role gets the least privileged role
    let role = session.role.unwrap_or(Role::User);
    if can_see(requested, Some(role)) {
        requested
    } else {
        HOME
    }
}

/// Sidebar entries for a role, in display order.
pub fn menu(role: Option<Role>) -> Vec<Screen> {
    MENU.iter().copied().filter(|screen| can_see(*screen, role)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Splash,
    Home,
    About,
    RequestReading,
    Status,
}

/// History of visited screens; the last entry is the one shown.
#[derive(Debug, Clone)]
pub struct Navigator {
    history: Vec<Route>,
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        Navigator { history: vec![initial] }
    }

    pub fn current(&self) -> Route {
        *self.history.last().unwrap_or(&Route::Home)
    }

    pub fn push(&mut self, route: Route) {
        if self.current() != route {
            self.history.push(route);
        }
    }

    pub fn replace(&mut self, route: Route) {
        self.history.pop();
        self.history.push(route);
    }

    pub fn back(&mut self) {
        if self.can_go_back() {
            self.history.pop();
        }
    }

    /// Whether `route` is shown or waiting below the current screen.
    pub fn contains(&self, route: Route) -> bool {
        self.history.contains(&route)
    }

    pub fn can_go_back(&self) -> bool {
        self.history.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splash_is_replaced_by_home() {
        let mut navigator = Navigator::new(Route::Splash);
        navigator.replace(Route::Home);

        assert_eq!(navigator.current(), Route::Home);
        assert!(!navigator.can_go_back());
    }

    #[test]
    fn back_returns_to_the_previous_screen() {
        let mut navigator = Navigator::new(Route::Home);
        navigator.push(Route::RequestReading);
        navigator.push(Route::Status);
        navigator.push(Route::Status);

        navigator.back();
        assert_eq!(navigator.current(), Route::RequestReading);
        navigator.back();
        navigator.back();
        assert_eq!(navigator.current(), Route::Home);
    }

    #[test]
    fn screens_below_the_current_one_are_kept() {
        let mut navigator = Navigator::new(Route::Home);
        navigator.push(Route::Status);
        navigator.push(Route::About);
        assert!(navigator.contains(Route::Status));

        navigator.back();
        navigator.back();
        assert!(!navigator.contains(Route::Status));
    }
}

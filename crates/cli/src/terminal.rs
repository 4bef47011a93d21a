//! The interactive terminal.
//!
//! Thin glue between a line-oriented reader/writer pair and the backend:
//! it prints menus, parses typed input into domain values, and renders
//! responses. All rules live in the backend. Validation and storage errors
//! are printed and the session continues; end of input ends the session.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use thiserror::Error;

use crustline_backend::models::{
    Item, ItemField, ItemFilter, Order, ProfileField, SortKey, UserField,
};
use crustline_backend::router::LOG_OUT_CHOICE;
use crustline_backend::{
    AccountDirectory, Action, Backend, CommandRouter, CoreError, MenuChange, MenuQuery,
    OrderLedger, Request, Response, Session, available_actions,
};
use crustline_core::{Login, OrderId, OrderStatus, Password, Price, Role, StoreId};

/// Typed at the item prompt to finish an order.
const DONE_SENTINEL: &str = "DONE";

/// Typed at an update prompt to leave a field alone.
const NO_CHANGE: &str = "0";

#[derive(Debug, Error)]
enum StepError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] CoreError),
}

type Step = Result<(), StepError>;

/// One interactive session.
pub struct Terminal<'a, R, W> {
    backend: &'a dyn Backend,
    input: R,
    output: W,
    session: Session,
}

impl<'a, R: BufRead, W: Write> Terminal<'a, R, W> {
    pub fn new(backend: &'a dyn Backend, input: R, output: W) -> Self {
        Self {
            backend,
            input,
            output,
            session: Session::anonymous(),
        }
    }

    /// Run until the user exits or input ends.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if reading or writing fails.
    pub async fn run(&mut self) -> io::Result<()> {
        match self.start_menu().await {
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                self.log_out();
                Ok(())
            }
            other => other,
        }
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.output
    }

    async fn start_menu(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.output, "\nMAIN MENU\n---------")?;
            writeln!(self.output, "1. Create user")?;
            writeln!(self.output, "2. Log in")?;
            writeln!(self.output, "9. < EXIT")?;

            match self.prompt("Please make your choice: ")?.trim() {
                "1" => self.create_user().await?,
                "2" => {
                    if self.log_in().await? {
                        self.user_menu().await?;
                    }
                }
                "9" => break,
                _ => writeln!(self.output, "Unrecognized choice!")?,
            }
        }
        writeln!(self.output, "Disconnecting from database...Done\n\nBye !")?;
        Ok(())
    }

    async fn user_menu(&mut self) -> io::Result<()> {
        while let Ok(role) = self.session.role() {
            writeln!(self.output, "\nMAIN MENU\n---------")?;
            for action in available_actions(role) {
                writeln!(self.output, "{}. {}", action.menu_number(), action.label())?;
            }
            writeln!(self.output, "{LOG_OUT_CHOICE}. Log out")?;

            let choice = self.prompt("Please make your choice: ")?;
            let Ok(number) = choice.trim().parse::<u32>() else {
                writeln!(self.output, "Unrecognized choice!")?;
                continue;
            };
            if number == LOG_OUT_CHOICE {
                self.log_out();
                break;
            }
            let Some(action) = Action::from_menu_number(number) else {
                writeln!(self.output, "Unrecognized choice!")?;
                continue;
            };

            match self.perform(action).await {
                Ok(()) => {}
                Err(StepError::Core(e)) => self.report(&e)?,
                Err(StepError::Io(e)) => return Err(e),
            }
        }
        Ok(())
    }

    async fn perform(&mut self, action: Action) -> Step {
        // Fail before prompting for anything the role may not do.
        CommandRouter::new(self.backend)
            .authorize(&mut self.session, action)
            .await?;

        match action {
            Action::ViewProfile => self.dispatch(Request::ViewProfile).await,
            Action::UpdateProfile => self.update_profile().await,
            Action::ViewMenu => self.view_menu().await,
            Action::PlaceOrder => self.place_order().await,
            Action::ViewOrderHistory => self.dispatch(Request::ViewOrderHistory).await,
            Action::ViewRecentOrders => self.dispatch(Request::ViewRecentOrders).await,
            Action::ViewOrderInfo => {
                let order_id: OrderId = parse(&self.prompt("Choose Order: ")?, "order ID")?;
                self.dispatch(Request::ViewOrderInfo(order_id)).await
            }
            Action::ViewStores => self.dispatch(Request::ViewStores).await,
            Action::UpdateOrderStatus => {
                let order_id: OrderId = parse(&self.prompt("Choose Order: ")?, "order ID")?;
                let status: OrderStatus = parse(&self.prompt("Choose Status: ")?, "status")?;
                self.dispatch(Request::UpdateOrderStatus { order_id, status })
                    .await
            }
            Action::UpdateMenu => self.update_menu().await,
            Action::UpdateUser => self.update_user().await,
        }
    }

    async fn dispatch(&mut self, request: Request) -> Step {
        let response = CommandRouter::new(self.backend)
            .dispatch(&mut self.session, request)
            .await?;
        self.render(&response)?;
        Ok(())
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    async fn create_user(&mut self) -> io::Result<()> {
        let login = self.prompt("\tEnter user login: ")?;
        let password = self.prompt("\tEnter user password: ")?;
        let phone = self.prompt("\tEnter user phone: ")?;

        match AccountDirectory::new(self.backend)
            .register(&login, &password, &phone)
            .await
        {
            Ok(login) => writeln!(self.output, "User {login} created!"),
            Err(e) => self.report(&e),
        }
    }

    async fn log_in(&mut self) -> io::Result<bool> {
        let login = self.prompt("\tEnter user login: ")?;
        let password = self.prompt("\tEnter user password: ")?;

        match CommandRouter::new(self.backend)
            .log_in(&mut self.session, &login, &password)
            .await
        {
            Ok(role) => {
                writeln!(self.output, "Logged in as {} ({role})", login.trim())?;
                Ok(true)
            }
            Err(e) => {
                self.report(&e)?;
                Ok(false)
            }
        }
    }

    fn log_out(&mut self) {
        if let Some(identity) = self.session.log_out() {
            tracing::info!(login = %identity.login, "Logged out");
        }
    }

    async fn update_profile(&mut self) -> Step {
        writeln!(self.output, "\n--- Update Profile ---")?;
        writeln!(self.output, "1. Change Password")?;
        writeln!(self.output, "2. Change Phone Number")?;

        let field = match self.prompt("Select an option: ")?.trim() {
            "1" => ProfileField::Password(Password::new(self.prompt("Enter new password: ")?)),
            "2" => ProfileField::Phone(self.prompt("Enter new phone number: ")?.trim().to_owned()),
            _ => {
                writeln!(self.output, "Invalid option.")?;
                return Ok(());
            }
        };

        CommandRouter::new(self.backend)
            .dispatch(&mut self.session, Request::UpdateProfile(vec![field]))
            .await?;
        writeln!(self.output, "Profile updated successfully!")?;
        Ok(())
    }

    async fn update_user(&mut self) -> Step {
        let target: Login = parse(&self.prompt("Choose Login: ")?, "login")?;
        let new_login = self.prompt_change("New Login (0 for no change): ")?;
        let password = self.prompt_change("New Password (0 for no change): ")?;
        let role = self.prompt_change("New Role (0 for no change): ")?;
        let favorites = self.prompt_change("New Favorite Items (0 for no change): ")?;
        let phone = self.prompt_change("New Phone Number (0 for no change): ")?;

        let mut changes = Vec::new();
        if let Some(password) = password {
            changes.push(UserField::Password(Password::new(password)));
        }
        if let Some(role) = role {
            changes.push(UserField::Role(parse::<Role>(&role, "role")?));
        }
        if let Some(favorites) = favorites {
            changes.push(UserField::FavoriteItems(favorites));
        }
        if let Some(phone) = phone {
            changes.push(UserField::Phone(phone));
        }
        if let Some(new_login) = new_login {
            changes.push(UserField::Login(parse(&new_login, "login")?));
        }

        self.dispatch(Request::UpdateUser {
            login: target,
            changes,
        })
        .await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    async fn view_menu(&mut self) -> Step {
        loop {
            writeln!(self.output, "\n--- Menu Options ---")?;
            writeln!(self.output, "1. View all items")?;
            writeln!(self.output, "2. Search for items")?;
            writeln!(self.output, "3. Exit")?;

            match self.prompt("Select an option: ")?.trim() {
                "1" => {
                    self.dispatch(Request::ViewMenu(MenuQuery::All(SortKey::None)))
                        .await?;
                    self.refine_listing().await?;
                }
                "2" => {
                    let category = self.prompt("Enter search parameter (ex: drinks, sides): ")?;
                    let max = self.prompt("Maximum price (blank for none): ")?;
                    let max_price = if max.trim().is_empty() {
                        None
                    } else {
                        Some(parse_price(&max)?)
                    };
                    let filter = ItemFilter::new(&category, max_price);
                    self.dispatch(Request::ViewMenu(MenuQuery::Search(filter)))
                        .await?;
                }
                "3" => return Ok(()),
                _ => writeln!(self.output, "Invalid option. Please try again.")?,
            }
        }
    }

    /// Re-sort or price-filter the full listing until the user types `exit`.
    async fn refine_listing(&mut self) -> Step {
        loop {
            let raw = self.prompt(
                "\nSort ('price asc', 'price desc'), filter ('< 4.00'), or 'exit': ",
            )?;
            let raw = raw.trim();
            if raw.eq_ignore_ascii_case("exit") {
                return Ok(());
            }

            let query = if let Some(max) = raw.strip_prefix('<') {
                MenuQuery::Below(parse_price(max)?)
            } else if let Ok(sort) = raw.parse::<SortKey>() {
                MenuQuery::All(sort)
            } else {
                writeln!(self.output, "Invalid option.")?;
                continue;
            };
            self.dispatch(Request::ViewMenu(query)).await?;
        }
    }

    async fn update_menu(&mut self) -> Step {
        writeln!(self.output, "Update existing item, or add new item:")?;
        writeln!(self.output, " 1. Update existing")?;
        writeln!(self.output, " 2. Add New")?;
        writeln!(self.output, " 3. Exit")?;

        let change = match self.prompt("Select an option: ")?.trim() {
            "1" => {
                let name = self.prompt("Choose Item: ")?.trim().to_owned();
                let price = self.prompt_change("New Price (0 for no change): ")?;
                let ingredients = self.prompt_change("New Ingredients (0 for no change): ")?;
                let kind = self.prompt_change("New Type (0 for no change): ")?;
                let description = self.prompt_change("New Description (0 for no change): ")?;

                let mut changes = Vec::new();
                if let Some(price) = price {
                    changes.push(ItemField::Price(parse_price(&price)?));
                }
                if let Some(ingredients) = ingredients {
                    changes.push(ItemField::Ingredients(ingredients));
                }
                if let Some(kind) = kind {
                    changes.push(ItemField::TypeOfItem(kind));
                }
                if let Some(description) = description {
                    changes.push(ItemField::Description(description));
                }
                MenuChange::Update { name, changes }
            }
            "2" => {
                let name = self.prompt("Item Name: ")?;
                let price = parse_price(&self.prompt("Price: ")?)?;
                let ingredients = self.prompt("Ingredients: ")?;
                let type_of_item = self.prompt("Type: ")?;
                let description = self.prompt("Description: ")?;
                MenuChange::Add(Item {
                    name: name.trim().to_owned(),
                    price,
                    ingredients: ingredients.trim().to_owned(),
                    type_of_item: type_of_item.trim().to_owned(),
                    description: description.trim().to_owned(),
                })
            }
            _ => return Ok(()),
        };

        self.dispatch(Request::UpdateMenu(change)).await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Place an order one line at a time until the user types `DONE`.
    ///
    /// A bad item or quantity is reported and the loop continues with the
    /// lines added so far.
    async fn place_order(&mut self) -> Step {
        let store_id: StoreId = parse(&self.prompt("Choose Store: ")?, "store ID")?;
        let ledger = OrderLedger::new(self.backend);
        let mut draft = ledger.begin_order(&self.session, store_id).await?;
        writeln!(self.output, "Started order {}", draft.id())?;

        loop {
            let item = self.prompt("Choose item (Enter DONE when finished): ")?;
            let item = item.trim();
            if item.eq_ignore_ascii_case(DONE_SENTINEL) {
                break;
            }

            let quantity = self.prompt("Choose quantity: ")?;
            let Ok(quantity) = quantity.trim().parse::<i32>() else {
                self.report(&CoreError::InvalidInput(format!(
                    "quantity must be a whole number: {}",
                    quantity.trim()
                )))?;
                continue;
            };

            match ledger.add_line(&mut draft, item, quantity).await {
                Ok(total) => writeln!(self.output, "Running total: ${total:.2}")?,
                Err(e) => self.report(&e)?,
            }
        }

        let placed = ledger.commit_order(draft).await?;
        self.render(&Response::Placed(placed))?;
        Ok(())
    }

    // =========================================================================
    // Output
    // =========================================================================

    fn render(&mut self, response: &Response) -> io::Result<()> {
        let out = &mut self.output;
        match response {
            Response::Profile(user) => {
                writeln!(out, "\n--- User Profile ---")?;
                writeln!(out, "Login: {}", user.login)?;
                writeln!(out, "Role: {}", user.role)?;
                writeln!(out, "Favorite Items: {}", user.favorite_items)?;
                writeln!(out, "Phone Number: {}", user.phone_num)?;
            }
            Response::Items(items) => {
                if items.is_empty() {
                    writeln!(out, "No items found.")?;
                }
                for item in items {
                    writeln!(
                        out,
                        "{:<24} {:>8}  {:<10} {} | {}",
                        item.name,
                        item.price.to_string(),
                        item.type_of_item,
                        item.ingredients,
                        item.description
                    )?;
                }
            }
            Response::Orders(orders) => write_orders(&mut *out, orders)?,
            Response::OrderDetail(detail) => {
                write_orders(&mut *out, std::slice::from_ref(&detail.order))?;
                writeln!(out, "Item                     Quantity")?;
                for line in &detail.lines {
                    writeln!(out, "{:<24} {:>8}", line.item_name, line.quantity)?;
                }
            }
            Response::Stores(stores) => {
                for store in stores {
                    writeln!(
                        out,
                        "{:>4}  {}, {}, {}",
                        store.id, store.address, store.city, store.state
                    )?;
                }
            }
            Response::Placed(placed) => {
                writeln!(
                    out,
                    "Order {} placed at store {}: {} line(s), total ${:.2}, status {}",
                    placed.order_id,
                    placed.store_id,
                    placed.lines.len(),
                    placed.total,
                    placed.status
                )?;
            }
            Response::Done => writeln!(out, "Done.")?,
        }
        Ok(())
    }

    fn report(&mut self, error: &CoreError) -> io::Result<()> {
        if !error.is_recoverable() {
            tracing::error!(error = %error, "Backing store statement failed");
        }
        writeln!(self.output, "Error: {error}")
    }

    /// Print a label and read one line, without its line ending.
    fn prompt(&mut self, label: &str) -> io::Result<String> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_owned())
    }

    /// Read an optional new value; `0` means "no change".
    fn prompt_change(&mut self, label: &str) -> io::Result<Option<String>> {
        let raw = self.prompt(label)?;
        let trimmed = raw.trim();
        Ok((trimmed != NO_CHANGE).then(|| trimmed.to_owned()))
    }
}

fn write_orders(out: &mut impl Write, orders: &[Order]) -> io::Result<()> {
    if orders.is_empty() {
        return writeln!(out, "No orders found.");
    }
    writeln!(out, "Order ID  Login            Store  Total      Status       Placed")?;
    for order in orders {
        writeln!(
            out,
            "{:<8}  {:<16} {:<6} ${:<9.2} {:<12} {}",
            order.id.to_string(),
            order.login.as_str(),
            order.store_id.to_string(),
            order.total_price,
            order.status.as_str(),
            order.ordered_at.format("%Y-%m-%d %H:%M:%S")
        )?;
    }
    Ok(())
}

fn parse<T>(raw: &str, what: &str) -> Result<T, CoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| CoreError::InvalidInput(format!("{what}: {e}")))
}

fn parse_price(raw: &str) -> Result<Price, CoreError> {
    Price::parse(raw).map_err(|e| CoreError::InvalidInput(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crustline_backend::MemoryBackend;
    use crustline_backend::db::CatalogStore;

    use super::*;

    async fn session_output(backend: &MemoryBackend, script: &str) -> String {
        let mut terminal = Terminal::new(backend, script.as_bytes(), Vec::new());
        terminal.run().await.unwrap();
        String::from_utf8(terminal.into_output()).unwrap()
    }

    #[tokio::test]
    async fn test_register_order_and_history() {
        let backend = MemoryBackend::with_demo_data();
        let script = "1\nalice\npw1\n555-1111\n\
                      2\nalice\npw1\n\
                      4\n1\nPepperoni Slice\n2\nCola\n1\nDONE\n\
                      5\n20\n9\n";

        let output = session_output(&backend, script).await;

        assert!(output.contains("User alice created!"));
        assert!(output.contains("Running total: $7.00"));
        assert!(output.contains("total $8.50, status incomplete"));
        assert!(output.contains("alice"));
        assert!(output.contains("Bye !"));
    }

    #[tokio::test]
    async fn test_bad_lines_do_not_abort_placement() {
        let backend = MemoryBackend::with_demo_data();
        let script = "2\nmanager\nmanager\n\
                      4\n2\nCalzone\n1\nCola\n0\nCola\nmany\nCola\n2\nDONE\n\
                      20\n9\n";

        let output = session_output(&backend, script).await;

        assert!(output.contains("item not found: Calzone"));
        assert!(output.contains("quantity must be at least 1"));
        assert!(output.contains("quantity must be a whole number"));
        assert!(output.contains("1 line(s), total $3.00"));
    }

    #[tokio::test]
    async fn test_customer_menu_hides_and_refuses_staff_actions() {
        let backend = MemoryBackend::with_demo_data();
        let script = "1\nbob\npw\n\n2\nbob\npw\n10\n20\n9\n";

        let output = session_output(&backend, script).await;

        assert!(!output.contains("10. Update Menu"));
        assert!(output.contains("Error: a customer may not update the menu"));
    }

    #[tokio::test]
    async fn test_wrong_password_is_reported() {
        let backend = MemoryBackend::with_demo_data();
        let output = session_output(&backend, "2\nmanager\nnope\n9\n").await;
        assert!(output.contains("Error: invalid login or password"));
    }

    #[tokio::test]
    async fn test_end_of_input_ends_session() {
        let backend = MemoryBackend::with_demo_data();
        let output = session_output(&backend, "2\nmanager\nmanager\n3\n").await;
        assert!(output.contains("--- Menu Options ---"));
        assert!(!output.contains("Bye !"));
    }

    #[tokio::test]
    async fn test_manager_updates_price() {
        let backend = MemoryBackend::with_demo_data();
        let script = "2\nmanager\nmanager\n\
                      10\n1\nCola\n$2.00\n0\n0\n0\n\
                      20\n9\n";

        let output = session_output(&backend, script).await;

        assert!(output.contains("Done."));
        let cola = backend.get_item("Cola").await.unwrap().unwrap();
        assert_eq!(cola.price, Price::from_cents(200).unwrap());
    }

    #[tokio::test]
    async fn test_out_of_range_price_is_reported() {
        let backend = MemoryBackend::with_demo_data();
        let script = "2\nmanager\nmanager\n\
                      10\n1\nCola\n100000000\n0\n0\n0\n\
                      10\n1\nCola\n1.005\n0\n0\n0\n\
                      20\n9\n";

        let output = session_output(&backend, script).await;

        assert!(output.contains("price cannot exceed $99999999.99"));
        assert!(output.contains("more than two decimal places"));
        assert!(output.contains("Bye !"));
        let cola = backend.get_item("Cola").await.unwrap().unwrap();
        assert_eq!(cola.price, Price::from_cents(150).unwrap());
    }

    #[tokio::test]
    async fn test_menu_filters() {
        let backend = MemoryBackend::with_demo_data();
        let script = "2\nmanager\nmanager\n\
                      3\n1\nprice desc\n< 2.00\nexit\n2\ndrinks\n\n3\n\
                      20\n9\n";

        let output = session_output(&backend, script).await;

        let desc = output.find("Caesar Salad").unwrap();
        assert!(output[desc..].contains("Cola"));
        assert!(output.matches("Lemonade").count() >= 2);
    }
}

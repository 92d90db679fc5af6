use prettytable::{row, Table};
use rust_decimal::Decimal;
use savepenses_core::{date_to_str, Group, Transaction};

pub fn transactions_table(transactions: &[Transaction]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["ID", "Date", "Type", "Amount", "Repeat", "Group", "Description"]);
    table.add_empty_row();

    for t in transactions {
        let date = date_to_str(t.date);
        let group = t.group_id.map(|g| g.to_string()).unwrap_or_default();
        let description = t.description.as_deref().unwrap_or("");
        table.add_row(row![t.id, date, t.kind, t.amount, t.repeat, group, description]);
    }

    table
}

/// Groups with their derived totals alongside.
pub fn groups_table(groups: &[(Group, Decimal)]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["ID", "Name", "Description", "Total"]);
    table.add_empty_row();

    for (group, total) in groups {
        let description = group.description.as_deref().unwrap_or("");
        table.add_row(row![group.id, group.name, description, total]);
    }

    table
}

pub fn balance_lines(income: Decimal, expense: Decimal, total: Decimal) -> String {
    format!("Income:  {}\nExpense: {}\nTotal:   {}\n", income, expense, total)
}
